//! `capsule run`: Launch a command inside a new container.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use capsule_common::config::RuntimeConfig;
use capsule_common::constants::{
    CGROUP_ROOT, DEFAULT_CGROUP_NAME, DEFAULT_HOSTNAME, DEFAULT_ROOTFS, LOG_FORMAT_ENV,
};
use capsule_common::types::{MemoryLimit, NamespaceSet};
use capsule_runtime::launcher::Launcher;
use clap::Args;

use super::LogFormat;
use crate::output;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory that becomes `/` inside the container.
    #[arg(long, env = "CAPSULE_ROOTFS", default_value = DEFAULT_ROOTFS)]
    pub rootfs: PathBuf,

    /// Hostname inside the container.
    #[arg(long, env = "CAPSULE_HOSTNAME", default_value = DEFAULT_HOSTNAME)]
    pub hostname: String,

    /// Memory ceiling, in bytes or with a KB/MB/GB/KiB/MiB/GiB suffix.
    #[arg(short, long, env = "CAPSULE_MEMORY", default_value_t = MemoryLimit::default())]
    pub memory: MemoryLimit,

    /// Resource-domain name. Concurrent runs sharing a name share one memory budget.
    #[arg(long, env = "CAPSULE_CGROUP_NAME", default_value = DEFAULT_CGROUP_NAME)]
    pub cgroup_name: String,

    /// Mount point of the control-group filesystem.
    #[arg(long, env = "CAPSULE_CGROUP_ROOT", default_value = CGROUP_ROOT)]
    pub cgroup_root: PathBuf,

    /// Command to execute, followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    fn config(&self) -> RuntimeConfig {
        RuntimeConfig {
            rootfs: self.rootfs.clone(),
            hostname: self.hostname.clone(),
            cgroup_root: self.cgroup_root.clone(),
            cgroup_name: self.cgroup_name.clone(),
            memory_limit: self.memory,
            namespaces: NamespaceSet::ALL,
        }
    }
}

/// Executes the `run` command.
///
/// Blocks until the container exits and returns its status unchanged.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the kernel refuses
/// to create the namespaced process.
pub fn execute(args: RunArgs, log_format: LogFormat) -> anyhow::Result<ExitCode> {
    tracing::debug!(
        memory = %output::format_bytes(args.memory.bytes()),
        cgroup = %args.cgroup_name,
        "run requested"
    );
    let launcher = Launcher::new().with_env(LOG_FORMAT_ENV, log_format.as_str());
    let outcome = launcher
        .launch(&args.command, args.config())
        .with_context(|| format!("could not start container for {:?}", args.command))?;
    Ok(output::exit_code(outcome))
}
