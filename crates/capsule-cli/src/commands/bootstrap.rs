//! `capsule bootstrap`: Internal role, started by `run` inside new namespaces.

use std::process::ExitCode;

use anyhow::Context;
use capsule_common::config::RuntimeConfig;
use capsule_runtime::bootstrap::{Bootstrap, LinuxHost};
use clap::Args;

use crate::output;

/// Arguments for the `bootstrap` role.
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Target command followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the bootstrap role.
///
/// Reads the launcher's configuration from the environment, prepares the
/// namespaces, runs the target and exits with its status.
///
/// # Errors
///
/// Returns an error if the configuration is missing or any setup step
/// before the target fails.
pub fn execute(args: BootstrapArgs) -> anyhow::Result<ExitCode> {
    let config = RuntimeConfig::from_env()?;
    let bootstrap = Bootstrap::new(config.clone(), &args.command)?;
    let mut host = LinuxHost::new(&config);

    let report = bootstrap
        .run(&mut host)
        .context("container setup failed; target command was not run")?;

    tracing::debug!(
        limits_applied = report.limits.is_applied(),
        cleanup_ok = report.cleanup.is_none(),
        status = %report.exit_status(),
        "bootstrap finished"
    );
    Ok(output::exit_code(report.exit_status()))
}
