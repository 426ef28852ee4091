//! System-wide constants and default paths.

/// Binary name for the CLI.
pub const BIN_NAME: &str = "capsule";

/// Role selector for the launcher invocation.
pub const ROLE_RUN: &str = "run";

/// Role selector for the re-executed bootstrap invocation.
pub const ROLE_BOOTSTRAP: &str = "bootstrap";

/// Live link to the running executable image.
pub const SELF_EXE: &str = "/proc/self/exe";

/// Environment variable carrying the bootstrap configuration as JSON.
pub const BOOTSTRAP_CONFIG_ENV: &str = "CAPSULE_BOOTSTRAP_CONFIG";

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "CAPSULE_LOG_FORMAT";

/// Default root filesystem for the isolated process.
pub const DEFAULT_ROOTFS: &str = "/rootfs";

/// Hostname set inside the new UTS namespace.
pub const DEFAULT_HOSTNAME: &str = "container";

/// Control-group filesystem mount point.
pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Marker file present only on a unified (v2) hierarchy.
pub const CGROUP_V2_MARKER: &str = "cgroup.controllers";

/// Subsystem directory holding memory domains on a legacy (v1) hierarchy.
pub const CGROUP_V1_MEMORY_SUBSYSTEM: &str = "memory";

/// Default resource-domain name.
pub const DEFAULT_CGROUP_NAME: &str = "capsule";

/// Default memory ceiling in bytes.
pub const DEFAULT_MEMORY_LIMIT: u64 = 100_000_000;

/// Mount point of the process-information filesystem inside the new root.
pub const PROC_MOUNT_POINT: &str = "/proc";

/// Exit status for faults raised before the target command runs.
pub const EXIT_SETUP_FAULT: i32 = 125;

/// Exit status when the target exists but cannot be executed.
pub const EXIT_CANNOT_EXECUTE: i32 = 126;

/// Exit status when the target command does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Base added to a signal number to form an exit status.
pub const EXIT_SIGNAL_BASE: i32 = 128;

/// Stack size for the clone(2) child, which only re-executes itself.
pub const CLONE_STACK_SIZE: usize = 256 * 1024;
