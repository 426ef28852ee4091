//! Process-information filesystem mount inside the new root.

use std::path::{Path, PathBuf};

use capsule_common::error::{CapsuleError, Result};

/// A live `proc` mount owned by the bootstrap.
///
/// Lives in the bootstrap's private mount namespace, so it is never visible
/// to the launcher. [`ProcMount::unmount`] is best-effort: the namespace,
/// and the mount with it, disappears when the bootstrap exits anyway.
#[derive(Debug, PartialEq, Eq)]
pub struct ProcMount {
    target: PathBuf,
}

impl ProcMount {
    /// Mounts a fresh `proc` filesystem at `target`, creating the directory if needed.
    ///
    /// Must run after the root change so `target` resolves inside the new root.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount point cannot be created or `mount(2)` fails.
    #[cfg(target_os = "linux")]
    pub fn mount(target: &Path) -> Result<Self> {
        use nix::mount::{MsFlags, mount};

        if !target.is_dir() {
            std::fs::create_dir_all(target).map_err(|e| CapsuleError::Io {
                path: target.to_path_buf(),
                source: e,
            })?;
        }
        mount(
            Some("proc"),
            target,
            Some("proc"),
            MsFlags::empty(),
            None::<&str>,
        )
        .map_err(|e| CapsuleError::PermissionDenied {
            message: format!("mounting proc at {} failed: {e}", target.display()),
        })?;
        tracing::debug!(target = %target.display(), "proc mounted");
        Ok(Self {
            target: target.to_path_buf(),
        })
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error: procfs mounts require Linux.
    #[cfg(not(target_os = "linux"))]
    pub fn mount(_target: &Path) -> Result<Self> {
        Err(CapsuleError::Config {
            message: "Linux required for native container operations".into(),
        })
    }

    /// Where the filesystem is mounted.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Unmounts the filesystem.
    ///
    /// # Errors
    ///
    /// Returns a cleanup warning if `umount(2)` fails.
    #[cfg(target_os = "linux")]
    pub fn unmount(self) -> Result<()> {
        nix::mount::umount(&self.target).map_err(|e| CapsuleError::Cleanup {
            message: format!("unmounting {} failed: {e}", self.target.display()),
        })?;
        tracing::debug!(target = %self.target.display(), "proc unmounted");
        Ok(())
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error: procfs mounts require Linux.
    #[cfg(not(target_os = "linux"))]
    pub fn unmount(self) -> Result<()> {
        Err(CapsuleError::Cleanup {
            message: "Linux required for native container operations".into(),
        })
    }
}
