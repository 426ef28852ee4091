//! CLI command definitions and dispatch.
//!
//! The first argument selects the role. Anything other than `run` or
//! `bootstrap` is rejected by the parser before any process or namespace
//! work begins.

pub mod bootstrap;
pub mod run;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

/// capsule: single-process container runtime.
#[derive(Parser, Debug)]
#[command(name = "capsule", version, about, long_about = None)]
pub struct Cli {
    /// Role to play.
    #[command(subcommand)]
    pub command: Command,

    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = capsule_common::constants::LOG_FORMAT_ENV,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

/// Available roles.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command inside a new container.
    Run(run::RunArgs),
    /// Finish container setup inside new namespaces (started by `run`).
    #[command(hide = true)]
    Bootstrap(bootstrap::BootstrapArgs),
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Returns the value accepted by `--log-format`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Dispatches the parsed role to its handler.
///
/// # Errors
///
/// Returns an error if the role fails before the target command could run.
pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Run(args) => run::execute(args, cli.log_format),
        Command::Bootstrap(args) => bootstrap::execute(args),
    }
}
