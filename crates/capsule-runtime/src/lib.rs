//! Container roles for the capsule runtime.
//!
//! One binary plays two roles. The [`launcher`] runs in the caller's
//! namespaces and re-executes the binary inside fresh ones; the
//! [`bootstrap`] runs there, applies the [`limiter`], isolates hostname,
//! root and `/proc`, then runs the target command via [`process`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bootstrap;
pub mod launcher;
pub mod limiter;
pub mod process;
