//! The bootstrap role: finishing isolation from inside the new namespaces.
//!
//! Steps run in a fixed order and none may be skipped:
//!
//! 1. resource limits (best-effort)
//! 2. hostname
//! 3. root change, including the working-directory reset
//! 4. `/proc` mount
//! 5. target command
//! 6. `/proc` unmount (best-effort)
//!
//! A fault in steps 2 to 4 aborts before the target runs. Target failure
//! and cleanup failure are results, reported side by side.

use std::path::{Path, PathBuf};

use capsule_common::config::RuntimeConfig;
use capsule_common::constants::PROC_MOUNT_POINT;
use capsule_common::error::{CapsuleError, Result};
use capsule_common::types::{MemoryLimit, RunOutcome};
use capsule_core::cgroup::ResourceDomain;
use capsule_core::filesystem::mount::ProcMount;

use crate::limiter::{LimitReport, ResourceLimiter};
use crate::process::TargetOutcome;

/// Kernel operations the bootstrap performs, one method per step.
///
/// [`LinuxHost`] issues the real syscalls; tests substitute a recorder.
pub trait IsolationHost {
    /// Applies the memory ceiling to the current process.
    fn limit_resources(&mut self, limit: MemoryLimit) -> LimitReport;

    /// Sets the hostname of the current UTS namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel refuses the change.
    fn set_hostname(&mut self, hostname: &str) -> Result<()>;

    /// Makes `root` the filesystem root and working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if either the root change or the directory change fails.
    fn change_root(&mut self, root: &Path) -> Result<()>;

    /// Mounts the process-information filesystem at `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount fails.
    fn mount_proc(&mut self, target: &Path) -> Result<()>;

    /// Runs the target and waits for it.
    fn run_target(&mut self, command: &str, args: &[String]) -> TargetOutcome;

    /// Undoes [`IsolationHost::mount_proc`].
    ///
    /// # Errors
    ///
    /// Returns a cleanup warning if the unmount fails.
    fn unmount_proc(&mut self) -> Result<()>;
}

/// Real host operations for a process that already lives in new namespaces.
#[derive(Debug)]
pub struct LinuxHost {
    limiter: ResourceLimiter<ResourceDomain>,
    proc_mount: Option<ProcMount>,
}

impl LinuxHost {
    /// Prepares host operations for the domain named in `config`.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            limiter: ResourceLimiter::new(ResourceDomain::new(
                &config.cgroup_root,
                &config.cgroup_name,
            )),
            proc_mount: None,
        }
    }
}

impl IsolationHost for LinuxHost {
    fn limit_resources(&mut self, limit: MemoryLimit) -> LimitReport {
        self.limiter.limit(limit, std::process::id())
    }

    fn set_hostname(&mut self, hostname: &str) -> Result<()> {
        capsule_core::namespace::uts::set_hostname(hostname)
    }

    fn change_root(&mut self, root: &Path) -> Result<()> {
        capsule_core::filesystem::chroot::change_root(root)
    }

    fn mount_proc(&mut self, target: &Path) -> Result<()> {
        self.proc_mount = Some(ProcMount::mount(target)?);
        Ok(())
    }

    fn run_target(&mut self, command: &str, args: &[String]) -> TargetOutcome {
        crate::process::run_target(command, args)
    }

    fn unmount_proc(&mut self) -> Result<()> {
        self.proc_mount.take().map_or(Ok(()), ProcMount::unmount)
    }
}

/// Everything that happened during a bootstrap that reached the target.
#[derive(Debug)]
pub struct BootstrapReport {
    /// Outcome of the resource limiter.
    pub limits: LimitReport,
    /// Outcome of the target command.
    pub target: TargetOutcome,
    /// Unmount fault, if teardown failed.
    pub cleanup: Option<CapsuleError>,
}

impl BootstrapReport {
    /// Status to exit with. Cleanup faults never change it.
    #[must_use]
    pub fn exit_status(&self) -> RunOutcome {
        self.target.exit_status()
    }
}

/// The bootstrap role for one target command.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: RuntimeConfig,
    command: String,
    args: Vec<String>,
}

impl Bootstrap {
    /// Creates a bootstrap for `command` (program followed by its arguments).
    ///
    /// # Errors
    ///
    /// Returns a usage error if `command` is empty.
    pub fn new(config: RuntimeConfig, command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| CapsuleError::Usage {
            message: "bootstrap needs a target command".into(),
        })?;
        Ok(Self {
            config,
            command: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Mount point of `/proc` inside the new root.
    #[must_use]
    pub fn proc_mount_point() -> PathBuf {
        PathBuf::from(PROC_MOUNT_POINT)
    }

    /// Runs the six-step sequence against `host`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal setup fault. The target has not run in that case.
    pub fn run(&self, host: &mut impl IsolationHost) -> Result<BootstrapReport> {
        tracing::info!(
            command = %self.command,
            args = ?self.args,
            pid = std::process::id(),
            "bootstrap started"
        );

        let limits = host.limit_resources(self.config.memory_limit);
        host.set_hostname(&self.config.hostname)?;
        host.change_root(&self.config.rootfs)?;
        host.mount_proc(&Self::proc_mount_point())?;

        let target = host.run_target(&self.command, &self.args);

        let cleanup = host.unmount_proc().err();
        if let Some(err) = &cleanup {
            tracing::warn!(error = %err, "cleanup incomplete; mount namespace teardown will finish it");
        }

        Ok(BootstrapReport {
            limits,
            target,
            cleanup,
        })
    }
}

#[cfg(test)]
mod tests {
    use capsule_core::cgroup::CgroupVersion;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        steps: Vec<&'static str>,
        fail_at: Option<&'static str>,
        target_status: Option<RunOutcome>,
    }

    impl Recorder {
        fn failing_at(step: &'static str) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::default()
            }
        }

        fn step(&mut self, name: &'static str) -> Result<()> {
            self.steps.push(name);
            if self.fail_at == Some(name) {
                let message = format!("{name} refused");
                return Err(if name == "unmount" {
                    CapsuleError::Cleanup { message }
                } else {
                    CapsuleError::PermissionDenied { message }
                });
            }
            Ok(())
        }
    }

    impl IsolationHost for Recorder {
        fn limit_resources(&mut self, limit: MemoryLimit) -> LimitReport {
            self.steps.push("limit");
            LimitReport::Applied {
                version: CgroupVersion::V2,
                limit,
            }
        }

        fn set_hostname(&mut self, _hostname: &str) -> Result<()> {
            self.step("hostname")
        }

        fn change_root(&mut self, _root: &Path) -> Result<()> {
            self.step("chroot")
        }

        fn mount_proc(&mut self, _target: &Path) -> Result<()> {
            self.step("mount")
        }

        fn run_target(&mut self, _command: &str, _args: &[String]) -> TargetOutcome {
            self.steps.push("target");
            TargetOutcome::Finished(self.target_status.unwrap_or(RunOutcome::Exited(0)))
        }

        fn unmount_proc(&mut self) -> Result<()> {
            self.step("unmount")
        }
    }

    fn bootstrap() -> Bootstrap {
        Bootstrap::new(
            RuntimeConfig::default(),
            &["/bin/sh".to_string(), "-c".to_string(), "echo hi".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn steps_run_in_order() {
        let mut host = Recorder::default();
        let report = bootstrap().run(&mut host).unwrap();
        assert_eq!(
            host.steps,
            vec!["limit", "hostname", "chroot", "mount", "target", "unmount"]
        );
        assert!(report.exit_status().success());
    }

    #[test]
    fn setup_fault_stops_before_target() {
        for step in ["hostname", "chroot", "mount"] {
            let mut host = Recorder::failing_at(step);
            let err = bootstrap().run(&mut host).unwrap_err();
            assert!(err.is_fatal());
            assert!(!host.steps.contains(&"target"), "target ran after {step} failed");
            assert_eq!(host.steps.last(), Some(&step));
        }
    }

    #[test]
    fn cleanup_fault_keeps_target_status() {
        let mut host = Recorder::failing_at("unmount");
        let report = bootstrap().run(&mut host).unwrap();
        assert!(report.exit_status().success());
        assert!(report.cleanup.is_some());
    }

    #[test]
    fn target_failure_is_a_result() {
        let mut host = Recorder {
            target_status: Some(RunOutcome::Exited(42)),
            ..Recorder::default()
        };
        let report = bootstrap().run(&mut host).unwrap();
        assert_eq!(report.exit_status(), RunOutcome::Exited(42));
        assert!(report.cleanup.is_none());
    }

    #[test]
    fn empty_command_is_a_usage_fault() {
        let err = Bootstrap::new(RuntimeConfig::default(), &[]).unwrap_err();
        assert!(matches!(err, CapsuleError::Usage { .. }));
    }
}
