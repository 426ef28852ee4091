//! Root filesystem switching via `chroot(2)`.
//!
//! `chroot` only changes what `/` resolves to. The working directory is
//! left where it was, possibly outside the new root, and relative `..`
//! walks from there escape. [`change_root`] therefore always moves the
//! working directory to the new `/` as part of the same step.

use std::path::Path;

use capsule_common::error::{CapsuleError, Result};

/// Makes `new_root` the process's `/` and moves the working directory into it.
///
/// # Errors
///
/// Returns an error if `chroot(2)` or `chdir(2)` fails.
#[cfg(target_os = "linux")]
pub fn change_root(new_root: &Path) -> Result<()> {
    nix::unistd::chroot(new_root).map_err(|e| CapsuleError::PermissionDenied {
        message: format!("chroot({}) failed: {e}", new_root.display()),
    })?;
    nix::unistd::chdir("/").map_err(|e| CapsuleError::PermissionDenied {
        message: format!("chdir(/) after chroot failed: {e}"),
    })?;
    tracing::info!(new_root = %new_root.display(), "root changed");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: root change is only supported on Linux.
#[cfg(not(target_os = "linux"))]
pub fn change_root(_new_root: &Path) -> Result<()> {
    Err(CapsuleError::Config {
        message: "Linux required for native container operations".into(),
    })
}
