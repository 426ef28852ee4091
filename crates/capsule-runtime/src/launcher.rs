//! The launcher role: creating the isolated bootstrap process.
//!
//! The launcher re-executes the running binary through `/proc/self/exe`
//! with the bootstrap role selector, asking the kernel to place the new
//! process in fresh namespaces as it is created. It then blocks until that
//! process exits and returns its status untouched.

use std::path::PathBuf;

use capsule_common::config::RuntimeConfig;
use capsule_common::constants::{BIN_NAME, BOOTSTRAP_CONFIG_ENV, EXIT_SETUP_FAULT, SELF_EXE};
use capsule_common::error::{CapsuleError, Result};
use capsule_common::types::{Role, RunOutcome};
use capsule_core::namespace::clone::IsolatedCommand;

/// Creates a process inside new namespaces and waits for it.
///
/// [`KernelNamespaces`] calls `clone(2)`; tests substitute a recorder.
pub trait NamespaceRequester {
    /// Starts `cmd` and blocks until it terminates.
    ///
    /// # Errors
    ///
    /// Returns an error if the process or its namespaces cannot be created.
    fn spawn_and_wait(&self, cmd: &IsolatedCommand) -> Result<RunOutcome>;
}

/// Requests namespaces from the running kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelNamespaces;

impl NamespaceRequester for KernelNamespaces {
    fn spawn_and_wait(&self, cmd: &IsolatedCommand) -> Result<RunOutcome> {
        let pid = capsule_core::namespace::clone::spawn_isolated(cmd)?;
        capsule_core::namespace::pid::wait_for_exit(pid)
    }
}

/// The launcher role.
#[derive(Debug)]
pub struct Launcher<R> {
    requester: R,
    program: PathBuf,
    extra_env: Vec<(String, String)>,
}

impl Launcher<KernelNamespaces> {
    /// Creates a launcher that re-executes the running binary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_requester(KernelNamespaces)
    }
}

impl Default for Launcher<KernelNamespaces> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: NamespaceRequester> Launcher<R> {
    /// Creates a launcher that creates processes through `requester`.
    pub fn with_requester(requester: R) -> Self {
        Self {
            requester,
            program: PathBuf::from(SELF_EXE),
            extra_env: Vec::new(),
        }
    }

    /// Passes an additional environment variable to the bootstrap.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    /// Builds the request for the bootstrap process without starting it.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an empty command, or a configuration error
    /// if `config` fails validation.
    pub fn request(&self, command: &[String], config: RuntimeConfig) -> Result<IsolatedCommand> {
        if command.first().is_none_or(String::is_empty) {
            return Err(CapsuleError::Usage {
                message: "run needs a command to execute".into(),
            });
        }
        let config = config.validate()?;

        let mut argv = Vec::with_capacity(command.len() + 2);
        argv.push(BIN_NAME.to_string());
        argv.push(Role::Bootstrap.as_str().to_string());
        argv.extend(command.iter().cloned());

        let mut env = vec![(BOOTSTRAP_CONFIG_ENV.to_string(), config.to_env_value()?)];
        env.extend(self.extra_env.iter().cloned());

        Ok(IsolatedCommand {
            program: self.program.clone(),
            argv,
            env,
            namespaces: config.namespaces,
            private_mounts: true,
        })
    }

    /// Runs `command` inside a new container rooted at `config.rootfs`.
    ///
    /// Returns the bootstrap's status unchanged: the target's own status,
    /// or the setup-fault status if the bootstrap aborted.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the kernel refuses to create
    /// the process. Nothing is spawned in either case.
    pub fn launch(&self, command: &[String], config: RuntimeConfig) -> Result<RunOutcome> {
        tracing::info!(
            command = ?command,
            pid = std::process::id(),
            rootfs = %config.rootfs.display(),
            "launching container"
        );
        let request = self.request(command, config)?;
        let outcome = self.requester.spawn_and_wait(&request)?;

        if outcome.code() == EXIT_SETUP_FAULT {
            tracing::error!(%outcome, "bootstrap aborted during setup");
        } else if !outcome.success() {
            tracing::warn!(%outcome, "container exited unsuccessfully");
        } else {
            tracing::info!(%outcome, "container exited");
        }
        Ok(outcome)
    }
}
