//! # capsule
//!
//! Single-process container runtime.
//! `capsule run` isolates a command in fresh namespaces under a memory
//! ceiling; the hidden `bootstrap` role is the same binary re-executed
//! inside those namespaces.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Cli, LogFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match commands::execute(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "aborting");
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{}: {err:#}", capsule_common::constants::BIN_NAME);
            }
            output::fault_exit_code(&err)
        }
    }
}

/// Logs go to stderr so the target's stdout is passed through untouched.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
