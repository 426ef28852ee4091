//! Control-group resource domains.
//!
//! Supports both the unified v2 hierarchy and the legacy v1 per-subsystem
//! layout. The generation is probed once from the marker file that only a
//! v2 root carries; there is no fallback loop.

pub mod memory;

use std::fmt;
use std::path::{Path, PathBuf};

use capsule_common::constants::{CGROUP_V1_MEMORY_SUBSYSTEM, CGROUP_V2_MARKER};
use capsule_common::error::{CapsuleError, Result};
use capsule_common::types::MemoryLimit;

/// Control-group interface generation available on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CgroupVersion {
    /// Legacy per-subsystem hierarchies (`<root>/memory/...`).
    V1,
    /// Unified single hierarchy.
    V2,
}

impl CgroupVersion {
    /// Probes `root` for the v2 marker file.
    #[must_use]
    pub fn detect(root: &Path) -> Self {
        if root.join(CGROUP_V2_MARKER).exists() {
            Self::V2
        } else {
            Self::V1
        }
    }

    /// Returns the directory a domain named `name` occupies under `root`.
    #[must_use]
    pub fn domain_path(self, root: &Path, name: &str) -> PathBuf {
        match self {
            Self::V2 => root.join(name),
            Self::V1 => root.join(CGROUP_V1_MEMORY_SUBSYSTEM).join(name),
        }
    }
}

impl fmt::Display for CgroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Narrow write access to one resource domain.
///
/// The runtime's resource limiter only talks to the kernel through this
/// trait, so its policy can be exercised against a fake.
pub trait DomainWriter {
    /// Interface generation this domain lives on.
    fn version(&self) -> CgroupVersion;

    /// Creates the domain directory, reusing it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create(&self) -> Result<()>;

    /// Writes the hard memory ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file cannot be written.
    fn set_memory_limit(&self, limit: MemoryLimit) -> Result<()>;

    /// Moves `pid` into the domain. Children it creates later inherit membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the membership file cannot be written.
    fn enroll(&self, pid: u32) -> Result<()>;
}

/// A named control group holding one memory ceiling.
///
/// Never removed here: a domain outlives the process that created it and
/// may be shared by every invocation that uses the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDomain {
    path: PathBuf,
    version: CgroupVersion,
}

impl ResourceDomain {
    /// Resolves the domain `name` under the hierarchy mounted at `root`.
    #[must_use]
    pub fn new(root: &Path, name: &str) -> Self {
        let version = CgroupVersion::detect(root);
        Self {
            path: version.domain_path(root, name),
            version,
        }
    }

    /// Path to this domain's directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configured memory ceiling back.
    ///
    /// # Errors
    ///
    /// Returns an error if the control file is missing or malformed.
    pub fn memory_limit(&self) -> Result<Option<u64>> {
        memory::memory_limit(&self.path, self.version)
    }
}

impl DomainWriter for ResourceDomain {
    fn version(&self) -> CgroupVersion {
        self.version
    }

    fn create(&self) -> Result<()> {
        match std::fs::create_dir(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), version = %self.version, "cgroup created");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %self.path.display(), "reusing existing cgroup");
                Ok(())
            }
            Err(e) => Err(CapsuleError::ResourceControl {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn set_memory_limit(&self, limit: MemoryLimit) -> Result<()> {
        memory::set_memory_limit(&self.path, self.version, limit)
    }

    fn enroll(&self, pid: u32) -> Result<()> {
        let procs_path = self.path.join("cgroup.procs");
        std::fs::write(&procs_path, pid.to_string()).map_err(|e| {
            CapsuleError::ResourceControl {
                path: procs_path,
                source: e,
            }
        })?;
        tracing::debug!(pid, "added process to cgroup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(CGROUP_V2_MARKER), "cpu memory pids\n").unwrap();
        root
    }

    fn v1_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join(CGROUP_V1_MEMORY_SUBSYSTEM)).unwrap();
        root
    }

    #[test]
    fn marker_file_selects_v2() {
        let root = v2_root();
        let domain = ResourceDomain::new(root.path(), "capsule");
        assert_eq!(domain.version(), CgroupVersion::V2);
        assert_eq!(domain.path(), root.path().join("capsule"));
    }

    #[test]
    fn missing_marker_selects_v1_memory_subsystem() {
        let root = v1_root();
        let domain = ResourceDomain::new(root.path(), "capsule");
        assert_eq!(domain.version(), CgroupVersion::V1);
        assert_eq!(domain.path(), root.path().join("memory").join("capsule"));
    }

    #[test]
    fn create_is_idempotent() {
        let root = v2_root();
        let domain = ResourceDomain::new(root.path(), "capsule");
        domain.create().unwrap();
        domain.create().unwrap();
        assert!(domain.path().is_dir());
    }

    #[test]
    fn repeated_ceiling_write_keeps_requested_value() {
        let root = v2_root();
        let domain = ResourceDomain::new(root.path(), "capsule");
        let limit = MemoryLimit::from_bytes(100_000_000).unwrap();
        domain.create().unwrap();
        domain.set_memory_limit(limit).unwrap();
        domain.set_memory_limit(limit).unwrap();
        assert_eq!(domain.memory_limit().unwrap(), Some(100_000_000));
    }

    #[test]
    fn v1_ceiling_uses_limit_in_bytes() {
        let root = v1_root();
        let domain = ResourceDomain::new(root.path(), "capsule");
        domain.create().unwrap();
        domain
            .set_memory_limit(MemoryLimit::from_bytes(2048).unwrap())
            .unwrap();
        let raw = std::fs::read_to_string(domain.path().join("memory.limit_in_bytes")).unwrap();
        assert_eq!(raw, "2048");
    }

    #[test]
    fn enroll_writes_pid_to_procs() {
        let root = v2_root();
        let domain = ResourceDomain::new(root.path(), "capsule");
        domain.create().unwrap();
        domain.enroll(4242).unwrap();
        let raw = std::fs::read_to_string(domain.path().join("cgroup.procs")).unwrap();
        assert_eq!(raw, "4242");
    }

    #[test]
    fn same_name_resolves_to_shared_domain() {
        let root = v2_root();
        let first = ResourceDomain::new(root.path(), "shared");
        let second = ResourceDomain::new(root.path(), "shared");
        first.create().unwrap();
        second.create().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn v1_without_memory_subsystem_fails_as_warning() {
        let root = tempfile::tempdir().unwrap();
        let domain = ResourceDomain::new(root.path(), "capsule");
        let err = domain.create().unwrap_err();
        assert!(!err.is_fatal());
    }
}
