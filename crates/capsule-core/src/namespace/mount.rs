//! Mount namespace isolation.
//!
//! A fresh mount namespace starts as a copy of the parent's table, with the
//! parent's propagation settings. Shared mounts would still forward events
//! back to the host, so the copy is made recursively private first.

use capsule_common::error::{CapsuleError, Result};

/// Marks every mount under `/` as private to the current mount namespace.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn make_mounts_private() -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| CapsuleError::PermissionDenied {
        message: format!("making / private failed: {e}"),
    })
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: mount namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn make_mounts_private() -> Result<()> {
    Err(CapsuleError::Config {
        message: "Linux required for native container operations".into(),
    })
}
