//! Best-effort memory confinement.
//!
//! A failure to create the domain, write the ceiling, or enroll the process
//! never stops the container: it runs unconfined and the caller receives a
//! [`LimitReport::Degraded`] listing what went wrong.

use capsule_common::error::CapsuleError;
use capsule_common::types::MemoryLimit;
use capsule_core::cgroup::{CgroupVersion, DomainWriter};

/// What the limiter managed to apply.
#[derive(Debug)]
pub enum LimitReport {
    /// Ceiling written and process enrolled.
    Applied {
        /// Interface generation used.
        version: CgroupVersion,
        /// Ceiling now in force.
        limit: MemoryLimit,
    },
    /// At least one step failed; the process may be unconfined.
    Degraded {
        /// Interface generation probed.
        version: CgroupVersion,
        /// Warning-level faults, in the order they occurred.
        warnings: Vec<CapsuleError>,
    },
}

impl LimitReport {
    /// Returns whether every step succeeded.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Returns the faults collected while applying limits.
    #[must_use]
    pub fn warnings(&self) -> &[CapsuleError] {
        match self {
            Self::Applied { .. } => &[],
            Self::Degraded { warnings, .. } => warnings,
        }
    }
}

/// Applies a memory ceiling to one resource domain.
#[derive(Debug)]
pub struct ResourceLimiter<W> {
    domain: W,
}

impl<W: DomainWriter> ResourceLimiter<W> {
    /// Creates a limiter writing through `domain`.
    pub const fn new(domain: W) -> Self {
        Self { domain }
    }

    /// Returns the underlying domain.
    pub const fn domain(&self) -> &W {
        &self.domain
    }

    /// Creates the domain if needed, writes `limit`, and enrolls `pid`.
    ///
    /// Ceiling and enrollment are attempted independently so that one
    /// failing does not skip the other. Both are skipped if the domain
    /// directory cannot be created.
    pub fn limit(&self, limit: MemoryLimit, pid: u32) -> LimitReport {
        let version = self.domain.version();
        let mut warnings = Vec::new();

        if let Err(e) = self.domain.create() {
            warnings.push(e);
        } else {
            if let Err(e) = self.domain.set_memory_limit(limit) {
                warnings.push(e);
            }
            if let Err(e) = self.domain.enroll(pid) {
                warnings.push(e);
            }
        }

        for warning in &warnings {
            tracing::warn!(error = %warning, "resource limit not applied; continuing unconfined");
        }
        if warnings.is_empty() {
            tracing::info!(%version, bytes = limit.bytes(), pid, "memory limit applied");
            LimitReport::Applied { version, limit }
        } else {
            LimitReport::Degraded { version, warnings }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use capsule_common::error::Result;

    use super::*;

    #[derive(Default)]
    struct FakeDomain {
        fail_create: bool,
        fail_limit: bool,
        fail_enroll: bool,
        calls: RefCell<Vec<String>>,
    }

    fn denied(file: &str) -> CapsuleError {
        CapsuleError::ResourceControl {
            path: PathBuf::from(file),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
    }

    impl DomainWriter for FakeDomain {
        fn version(&self) -> CgroupVersion {
            CgroupVersion::V2
        }

        fn create(&self) -> Result<()> {
            self.calls.borrow_mut().push("create".into());
            if self.fail_create {
                return Err(denied("capsule"));
            }
            Ok(())
        }

        fn set_memory_limit(&self, limit: MemoryLimit) -> Result<()> {
            self.calls.borrow_mut().push(format!("limit {limit}"));
            if self.fail_limit {
                return Err(denied("memory.max"));
            }
            Ok(())
        }

        fn enroll(&self, pid: u32) -> Result<()> {
            self.calls.borrow_mut().push(format!("enroll {pid}"));
            if self.fail_enroll {
                return Err(denied("cgroup.procs"));
            }
            Ok(())
        }
    }

    #[test]
    fn all_steps_succeed() {
        let limiter = ResourceLimiter::new(FakeDomain::default());
        let report = limiter.limit(MemoryLimit::default(), 1);
        assert!(report.is_applied());
        assert_eq!(
            *limiter.domain().calls.borrow(),
            vec!["create", "limit 100000000", "enroll 1"]
        );
    }

    #[test]
    fn ceiling_failure_still_enrolls() {
        let limiter = ResourceLimiter::new(FakeDomain {
            fail_limit: true,
            ..FakeDomain::default()
        });
        let report = limiter.limit(MemoryLimit::default(), 1);
        assert_eq!(report.warnings().len(), 1);
        assert!(limiter.domain().calls.borrow().contains(&"enroll 1".to_string()));
    }

    #[test]
    fn create_failure_skips_writes() {
        let limiter = ResourceLimiter::new(FakeDomain {
            fail_create: true,
            ..FakeDomain::default()
        });
        let report = limiter.limit(MemoryLimit::default(), 1);
        assert!(!report.is_applied());
        assert_eq!(*limiter.domain().calls.borrow(), vec!["create"]);
    }

    #[test]
    fn every_warning_is_non_fatal() {
        let limiter = ResourceLimiter::new(FakeDomain {
            fail_limit: true,
            fail_enroll: true,
            ..FakeDomain::default()
        });
        let report = limiter.limit(MemoryLimit::default(), 1);
        assert_eq!(report.warnings().len(), 2);
        assert!(report.warnings().iter().all(|w| !w.is_fatal()));
    }
}
