//! Target command execution inside the prepared environment.
//!
//! The target inherits the bootstrap's standard streams and environment,
//! minus the variables the launcher used to hand over its configuration.

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};

use capsule_common::constants::{
    BOOTSTRAP_CONFIG_ENV, EXIT_CANNOT_EXECUTE, EXIT_NOT_FOUND, LOG_FORMAT_ENV,
};
use capsule_common::error::CapsuleError;
use capsule_common::types::RunOutcome;

/// How the target command fared.
///
/// Neither variant is a setup fault: both become the overall exit status.
#[derive(Debug)]
pub enum TargetOutcome {
    /// The target ran to completion, successfully or not.
    Finished(RunOutcome),
    /// The target could not be started.
    FailedToStart(CapsuleError),
}

impl TargetOutcome {
    /// Returns the status to report for this outcome.
    ///
    /// A missing executable maps to 127 and any other start failure to 126.
    #[must_use]
    pub fn exit_status(&self) -> RunOutcome {
        match self {
            Self::Finished(outcome) => *outcome,
            Self::FailedToStart(CapsuleError::TargetSpawn { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                RunOutcome::Exited(EXIT_NOT_FOUND)
            }
            Self::FailedToStart(_) => RunOutcome::Exited(EXIT_CANNOT_EXECUTE),
        }
    }
}

/// Runs `command` with `args` and blocks until it exits.
pub fn run_target(command: &str, args: &[String]) -> TargetOutcome {
    tracing::info!(command, ?args, "running target command");
    let status = target_command(command, args).status();

    match status {
        Ok(status) => {
            let outcome = outcome_of(status);
            tracing::info!(command, %outcome, "target command finished");
            TargetOutcome::Finished(outcome)
        }
        Err(e) => {
            let err = CapsuleError::TargetSpawn {
                command: command.to_string(),
                source: e,
            };
            tracing::error!(error = %err, "target command did not start");
            TargetOutcome::FailedToStart(err)
        }
    }
}

fn target_command(command: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(command);
    let _ = cmd
        .args(args)
        .env_remove(BOOTSTRAP_CONFIG_ENV)
        .env_remove(LOG_FORMAT_ENV);
    cmd
}

fn outcome_of(status: ExitStatus) -> RunOutcome {
    match (status.code(), status.signal()) {
        (Some(code), _) => RunOutcome::Exited(code),
        (None, Some(signal)) => RunOutcome::Signaled(signal),
        (None, None) => RunOutcome::Exited(EXIT_CANNOT_EXECUTE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> TargetOutcome {
        run_target("sh", &["-c".to_string(), script.to_string()])
    }

    #[test]
    fn zero_exit_is_success() {
        assert!(sh("exit 0").exit_status().success());
    }

    #[test]
    fn non_zero_exit_is_passed_through() {
        assert_eq!(sh("exit 3").exit_status(), RunOutcome::Exited(3));
    }

    #[test]
    fn signal_death_is_passed_through() {
        assert_eq!(sh("kill -TERM $$").exit_status(), RunOutcome::Signaled(15));
    }

    #[test]
    fn missing_binary_maps_to_127() {
        let outcome = run_target("/nonexistent-binary", &[]);
        assert!(matches!(outcome, TargetOutcome::FailedToStart(_)));
        assert_eq!(outcome.exit_status().code(), 127);
    }

    #[test]
    fn non_executable_file_maps_to_126() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let outcome = run_target(&file.path().to_string_lossy(), &[]);
        assert_eq!(outcome.exit_status().code(), 126);
    }

    #[test]
    fn handover_variables_are_removed() {
        let cmd = target_command("true", &[]);
        let removed: Vec<_> = cmd
            .get_envs()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key.to_string_lossy().into_owned())
            .collect();
        assert!(removed.contains(&BOOTSTRAP_CONFIG_ENV.to_string()));
        assert!(removed.contains(&LOG_FORMAT_ENV.to_string()));
    }
}
