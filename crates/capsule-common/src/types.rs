//! Domain primitive types used across the capsule workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{EXIT_SETUP_FAULT, EXIT_SIGNAL_BASE};
use crate::error::CapsuleError;

/// The role an invocation of the binary plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Runs in the caller's namespaces and creates the isolated child.
    Run,
    /// Runs inside the new namespaces and prepares them for the target.
    Bootstrap,
}

impl Role {
    /// Returns the argument-vector selector for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => crate::constants::ROLE_RUN,
            Self::Bootstrap => crate::constants::ROLE_BOOTSTRAP,
        }
    }
}

impl FromStr for Role {
    type Err = CapsuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            crate::constants::ROLE_RUN => Ok(Self::Run),
            crate::constants::ROLE_BOOTSTRAP => Ok(Self::Bootstrap),
            other => Err(CapsuleError::Usage {
                message: format!("unknown role '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The namespace kinds requested for the isolated process.
///
/// Fixed at process-creation time; a running process cannot extend it.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceSet {
    /// Isolate hostname and domain name.
    pub uts: bool,
    /// Isolate process IDs.
    pub pid: bool,
    /// Isolate the mount table.
    pub mount: bool,
    /// Isolate the network stack.
    pub network: bool,
    /// Isolate System V IPC and POSIX message queues.
    pub ipc: bool,
}

impl NamespaceSet {
    /// Every namespace kind this runtime knows how to request.
    pub const ALL: Self = Self {
        uts: true,
        pid: true,
        mount: true,
        network: true,
        ipc: true,
    };

    /// Returns the names of the enabled kinds, for logging.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        [
            (self.uts, "uts"),
            (self.pid, "pid"),
            (self.mount, "mount"),
            (self.network, "net"),
            (self.ipc, "ipc"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self::ALL
    }
}

/// How a process ended, as observed by whoever waited on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// Exited normally with the given code.
    Exited(i32),
    /// Terminated by the given signal number.
    Signaled(i32),
}

impl RunOutcome {
    /// Outcome used when setup aborts before the target runs.
    pub const SETUP_FAULT: Self = Self::Exited(EXIT_SETUP_FAULT);

    /// Returns the shell-style exit status for this outcome.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => EXIT_SIGNAL_BASE + signal,
        }
    }

    /// Returns whether the process exited with status zero.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "killed by signal {signal}"),
        }
    }
}

/// A memory ceiling in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryLimit(u64);

impl MemoryLimit {
    /// Creates a ceiling from a byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is zero.
    pub fn from_bytes(bytes: u64) -> crate::error::Result<Self> {
        if bytes == 0 {
            return Err(CapsuleError::Config {
                message: "memory limit must be greater than zero".into(),
            });
        }
        Ok(Self(bytes))
    }

    /// Returns the ceiling in bytes.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl Default for MemoryLimit {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_MEMORY_LIMIT)
    }
}

impl fmt::Display for MemoryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemoryLimit {
    type Err = CapsuleError;

    /// Parses strings like "128MiB", "256MB", "1GiB" or plain byte counts.
    #[allow(clippy::option_if_let_else)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GiB") {
            (n, 1024 * 1024 * 1024)
        } else if let Some(n) = s.strip_suffix("GB") {
            (n, 1_000_000_000)
        } else if let Some(n) = s.strip_suffix("MiB") {
            (n, 1024 * 1024)
        } else if let Some(n) = s.strip_suffix("MB") {
            (n, 1_000_000)
        } else if let Some(n) = s.strip_suffix("KiB") {
            (n, 1024)
        } else if let Some(n) = s.strip_suffix("KB") {
            (n, 1000)
        } else {
            (s, 1)
        };
        let bytes = num_str
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .ok_or_else(|| CapsuleError::Config {
                message: format!("invalid memory size: {s}"),
            })?;
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_selectors() {
        assert_eq!("run".parse::<Role>().ok(), Some(Role::Run));
        assert_eq!("bootstrap".parse::<Role>().ok(), Some(Role::Bootstrap));
    }

    #[test]
    fn role_rejects_unknown_selector() {
        let err = "child".parse::<Role>().unwrap_err();
        assert!(matches!(err, CapsuleError::Usage { .. }));
    }

    #[test]
    fn default_namespace_set_requests_everything() {
        let set = NamespaceSet::default();
        assert_eq!(set.kinds(), vec!["uts", "pid", "mount", "net", "ipc"]);
    }

    #[test]
    fn signaled_outcome_maps_to_shell_status() {
        assert_eq!(RunOutcome::Signaled(9).code(), 137);
        assert!(!RunOutcome::Signaled(9).success());
    }

    #[test]
    fn setup_fault_differs_from_not_found() {
        assert_ne!(
            RunOutcome::SETUP_FAULT.code(),
            crate::constants::EXIT_NOT_FOUND
        );
    }

    #[test]
    fn parse_memory_mib() {
        let limit: MemoryLimit = "128MiB".parse().unwrap();
        assert_eq!(limit.bytes(), 128 * 1024 * 1024);
    }

    #[test]
    fn parse_memory_gb() {
        let limit: MemoryLimit = "1GB".parse().unwrap();
        assert_eq!(limit.bytes(), 1_000_000_000);
    }

    #[test]
    fn parse_memory_plain_bytes() {
        let limit: MemoryLimit = "100000000".parse().unwrap();
        assert_eq!(limit, MemoryLimit::default());
    }

    #[test]
    fn parse_memory_rejects_garbage_and_zero() {
        assert!("abc".parse::<MemoryLimit>().is_err());
        assert!("0".parse::<MemoryLimit>().is_err());
        assert!("99999999999999GiB".parse::<MemoryLimit>().is_err());
    }
}
