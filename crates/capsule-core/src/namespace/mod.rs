//! Linux namespace management for container isolation.
//!
//! Namespaces are requested as `clone(2)` flags so the new process starts
//! life already isolated. Nothing here calls `unshare(2)` on the caller.

pub mod clone;
pub mod mount;
pub mod pid;
pub mod uts;

#[cfg(target_os = "linux")]
use capsule_common::types::NamespaceSet;
#[cfg(target_os = "linux")]
use nix::sched::CloneFlags;

/// Translates a [`NamespaceSet`] into the matching `CLONE_NEW*` flags.
#[cfg(target_os = "linux")]
#[must_use]
pub fn clone_flags(set: &NamespaceSet) -> CloneFlags {
    let mut flags = CloneFlags::empty();
    if set.uts {
        flags |= CloneFlags::CLONE_NEWUTS;
    }
    if set.pid {
        flags |= CloneFlags::CLONE_NEWPID;
    }
    if set.mount {
        flags |= CloneFlags::CLONE_NEWNS;
    }
    if set.network {
        flags |= CloneFlags::CLONE_NEWNET;
    }
    if set.ipc {
        flags |= CloneFlags::CLONE_NEWIPC;
    }
    flags
}
