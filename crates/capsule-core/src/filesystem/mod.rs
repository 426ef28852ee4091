//! Filesystem management for container isolation.
//!
//! Provides the `chroot(2)` root change and the process-information
//! filesystem mount placed inside the new root.

pub mod chroot;
pub mod mount;
