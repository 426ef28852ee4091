//! Runtime configuration model.
//!
//! The launcher builds a [`RuntimeConfig`] from its command line and hands
//! it to the bootstrap through the environment, so the bootstrap's argument
//! vector stays exactly the role selector followed by the target command.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOOTSTRAP_CONFIG_ENV, CGROUP_ROOT, DEFAULT_CGROUP_NAME, DEFAULT_HOSTNAME, DEFAULT_ROOTFS,
};
use crate::error::{CapsuleError, Result};
use crate::types::{MemoryLimit, NamespaceSet};

/// Longest hostname `sethostname(2)` accepts on Linux.
const MAX_HOSTNAME_LEN: usize = 64;

/// Everything the bootstrap needs besides the target command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory that becomes `/` for the isolated process.
    pub rootfs: PathBuf,
    /// Hostname set inside the new UTS namespace.
    pub hostname: String,
    /// Mount point of the control-group filesystem.
    pub cgroup_root: PathBuf,
    /// Name of the resource domain created under `cgroup_root`.
    pub cgroup_name: String,
    /// Memory ceiling applied to the resource domain.
    pub memory_limit: MemoryLimit,
    /// Namespace kinds requested at process creation.
    pub namespaces: NamespaceSet,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from(DEFAULT_ROOTFS),
            hostname: DEFAULT_HOSTNAME.to_string(),
            cgroup_root: PathBuf::from(CGROUP_ROOT),
            cgroup_name: DEFAULT_CGROUP_NAME.to_string(),
            memory_limit: MemoryLimit::default(),
            namespaces: NamespaceSet::default(),
        }
    }
}

impl RuntimeConfig {
    /// Checks the configuration and canonicalizes the root filesystem path.
    ///
    /// Runs in the launcher, before any process is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the rootfs is missing or not a directory, the
    /// hostname is empty, or the domain name is not a single path component.
    pub fn validate(mut self) -> Result<Self> {
        let rootfs = self
            .rootfs
            .canonicalize()
            .map_err(|e| CapsuleError::Io {
                path: self.rootfs.clone(),
                source: e,
            })?;
        if !rootfs.is_dir() {
            return Err(CapsuleError::Config {
                message: format!("rootfs {} is not a directory", rootfs.display()),
            });
        }
        self.rootfs = rootfs;

        if self.hostname.is_empty() || self.hostname.len() > MAX_HOSTNAME_LEN {
            return Err(CapsuleError::Config {
                message: format!(
                    "hostname must be 1 to {MAX_HOSTNAME_LEN} bytes, got {}",
                    self.hostname.len()
                ),
            });
        }

        if !is_single_component(&self.cgroup_name) {
            return Err(CapsuleError::Config {
                message: format!(
                    "cgroup name '{}' must be a single path component",
                    self.cgroup_name
                ),
            });
        }
        Ok(self)
    }

    /// Encodes the configuration for the bootstrap's environment.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_env_value(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a configuration produced by [`Self::to_env_value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid encoded configuration.
    pub fn from_env_value(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }

    /// Reads the configuration the launcher left in this process's environment.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the variable is absent, which means the
    /// bootstrap role was invoked directly rather than by the launcher.
    pub fn from_env() -> Result<Self> {
        let value = std::env::var(BOOTSTRAP_CONFIG_ENV).map_err(|_| CapsuleError::Usage {
            message: format!(
                "{BOOTSTRAP_CONFIG_ENV} is not set; the bootstrap role is started by 'run'"
            ),
        })?;
        Self::from_env_value(&value)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(rootfs: &Path) -> RuntimeConfig {
        RuntimeConfig {
            rootfs: rootfs.to_path_buf(),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn defaults_match_reference_layout() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.rootfs, PathBuf::from("/rootfs"));
        assert_eq!(cfg.hostname, "container");
        assert_eq!(cfg.memory_limit.bytes(), 100_000_000);
        assert_eq!(cfg.namespaces, NamespaceSet::ALL);
    }

    #[test]
    fn env_value_roundtrip_preserves_fields() {
        let cfg = RuntimeConfig {
            cgroup_name: "job-42".into(),
            memory_limit: MemoryLimit::from_bytes(64 * 1024 * 1024).unwrap(),
            ..RuntimeConfig::default()
        };
        let decoded = RuntimeConfig::from_env_value(&cfg.to_env_value().unwrap()).unwrap();
        assert_eq!(decoded, cfg);
    }

    #[test]
    fn malformed_env_value_is_rejected() {
        let err = RuntimeConfig::from_env_value("{not json").unwrap_err();
        assert!(matches!(err, CapsuleError::Serialization { .. }));
    }

    #[test]
    fn validate_canonicalizes_rootfs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir(&nested).unwrap();
        let cfg = config_for(&nested.join("..").join("a")).validate().unwrap();
        assert_eq!(cfg.rootfs, nested.canonicalize().unwrap());
    }

    #[test]
    fn validate_rejects_missing_rootfs() {
        let err = config_for(Path::new("/definitely/not/here"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, CapsuleError::Io { .. }));
    }

    #[test]
    fn validate_rejects_file_as_rootfs() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = config_for(file.path()).validate().unwrap_err();
        assert!(matches!(err, CapsuleError::Config { .. }));
    }

    #[test]
    fn validate_rejects_nested_cgroup_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a/b", "..", "/abs", ""] {
            let cfg = RuntimeConfig {
                cgroup_name: name.into(),
                ..config_for(dir.path())
            };
            assert!(cfg.validate().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn validate_rejects_empty_or_oversized_hostname() {
        let dir = tempfile::tempdir().unwrap();
        for hostname in [String::new(), "h".repeat(65)] {
            let cfg = RuntimeConfig {
                hostname,
                ..config_for(dir.path())
            };
            assert!(cfg.validate().is_err());
        }
    }
}
