//! UTS namespace isolation.
//!
//! Allows the container to have its own hostname and domain name.

use capsule_common::error::{CapsuleError, Result};

/// Sets the hostname inside the UTS namespace.
///
/// Only safe to call from a process that was created with `CLONE_NEWUTS`;
/// anywhere else this renames the host.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails.
#[cfg(target_os = "linux")]
pub fn set_hostname(hostname: &str) -> Result<()> {
    nix::unistd::sethostname(hostname).map_err(|e| CapsuleError::PermissionDenied {
        message: format!("sethostname({hostname}) failed: {e}"),
    })?;
    tracing::debug!(hostname, "hostname set");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: UTS namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn set_hostname(_hostname: &str) -> Result<()> {
    Err(CapsuleError::Config {
        message: "Linux required for native container operations".into(),
    })
}
