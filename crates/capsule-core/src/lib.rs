//! # capsule-core
//!
//! Low-level Linux isolation primitives for the capsule runtime.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: UTS, PID, mount, network and IPC isolation requested
//!   atomically at `clone(2)` time, plus hostname and mount propagation.
//! - **Cgroups**: v1/v2 detection and a memory-limited resource domain.
//! - **Filesystem**: `chroot(2)` root change and the `/proc` mount.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod filesystem;
pub mod namespace;
