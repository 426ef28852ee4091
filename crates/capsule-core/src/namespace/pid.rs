//! PID namespace helpers.
//!
//! The process created by [`super::clone::spawn_isolated`] is PID 1 of its
//! namespace. Its parent only ever observes it through `waitpid(2)`.

use capsule_common::error::{CapsuleError, Result};
use capsule_common::types::RunOutcome;

/// Blocks until `pid` terminates and returns how it ended.
///
/// Stop/continue notifications and `EINTR` are skipped; only exit or
/// death-by-signal resolves the wait.
///
/// # Errors
///
/// Returns an error if `waitpid(2)` fails, e.g. `pid` is not our child.
#[cfg(target_os = "linux")]
pub fn wait_for_exit(pid: u32) -> Result<RunOutcome> {
    use nix::errno::Errno;
    use nix::sys::wait::{WaitStatus, waitpid};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| CapsuleError::Config {
        message: format!("pid {pid} out of range"),
    })?;

    loop {
        match waitpid(Pid::from_raw(raw), None) {
            Ok(WaitStatus::Exited(_, code)) => {
                tracing::debug!(pid, code, "process exited");
                return Ok(RunOutcome::Exited(code));
            }
            Ok(WaitStatus::Signaled(_, signal, core_dumped)) => {
                tracing::debug!(pid, %signal, core_dumped, "process killed by signal");
                return Ok(RunOutcome::Signaled(signal as i32));
            }
            Ok(other) => tracing::trace!(pid, ?other, "non-terminal wait status"),
            Err(Errno::EINTR) => {}
            Err(e) => {
                return Err(CapsuleError::Io {
                    path: format!("/proc/{pid}").into(),
                    source: e.into(),
                });
            }
        }
    }
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: namespaced processes require Linux.
#[cfg(not(target_os = "linux"))]
pub fn wait_for_exit(_pid: u32) -> Result<RunOutcome> {
    Err(CapsuleError::Config {
        message: "Linux required for native container operations".into(),
    })
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn exit_code_of_plain_child_is_reported() {
        let child = std::process::Command::new("sh")
            .args(["-c", "exit 7"])
            .spawn()
            .unwrap();
        let outcome = wait_for_exit(child.id()).unwrap();
        assert_eq!(outcome, RunOutcome::Exited(7));
    }

    #[test]
    fn signal_death_is_reported() {
        let child = std::process::Command::new("sh")
            .args(["-c", "kill -9 $$"])
            .spawn()
            .unwrap();
        let outcome = wait_for_exit(child.id()).unwrap();
        assert_eq!(outcome, RunOutcome::Signaled(9));
        assert_eq!(outcome.code(), 137);
    }

    #[test]
    fn waiting_on_a_stranger_fails() {
        // PID 1 is never a child of the test process.
        assert!(wait_for_exit(1).is_err());
    }
}
