//! Process creation inside fresh namespaces.
//!
//! Wraps `clone(2)` so that every requested namespace exists before the new
//! process executes a single instruction of its own. The child immediately
//! re-executes the given program; nothing else runs in the cloned image.

use std::ffi::{CString, OsStr};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;

use capsule_common::error::{CapsuleError, Result};
use capsule_common::types::NamespaceSet;

/// A process to create inside new namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedCommand {
    /// Executable image for the new process.
    pub program: PathBuf,
    /// Full argument vector, including `argv[0]`.
    pub argv: Vec<String>,
    /// Variables added to, or replacing entries in, the inherited environment.
    pub env: Vec<(String, String)>,
    /// Namespace kinds requested at creation.
    pub namespaces: NamespaceSet,
    /// Remount `/` recursively private in the child before it executes.
    pub private_mounts: bool,
}

/// Creates the process described by `cmd` and returns its host PID.
///
/// Standard streams are inherited. The child reports its own setup faults
/// on stderr and exits with the setup-fault status.
///
/// # Errors
///
/// Returns an error if an argument contains a NUL byte or if the kernel
/// refuses the `clone(2)` call (commonly missing `CAP_SYS_ADMIN`).
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
pub fn spawn_isolated(cmd: &IsolatedCommand) -> Result<u32> {
    use capsule_common::constants::CLONE_STACK_SIZE;
    use nix::sched::clone;

    let program = to_cstring(cmd.program.as_os_str().as_bytes())?;
    let argv = cmd
        .argv
        .iter()
        .map(|arg| to_cstring(arg.as_bytes()))
        .collect::<Result<Vec<_>>>()?;
    let envp = build_env(&cmd.env)?;
    let flags = super::clone_flags(&cmd.namespaces);
    let private_mounts = cmd.private_mounts && cmd.namespaces.mount;

    let mut stack = vec![0_u8; CLONE_STACK_SIZE];
    let child = Box::new(|| -> isize {
        if private_mounts {
            if let Err(e) = super::mount::make_mounts_private() {
                return child_fault("mount propagation", &e);
            }
        }
        let Err(errno) = nix::unistd::execve(&program, &argv, &envp);
        child_fault("re-exec", &errno)
    });

    // SAFETY: no CLONE_VM is passed, so the child runs on a private copy of
    // this address space; the callback only touches data prepared above and
    // ends in execve(2) or an exit.
    let pid = unsafe { clone(child, &mut stack, flags, Some(libc::SIGCHLD)) }.map_err(|e| {
        CapsuleError::PermissionDenied {
            message: format!(
                "clone with namespaces {:?} failed: {e}",
                cmd.namespaces.kinds()
            ),
        }
    })?;

    let pid = u32::try_from(pid.as_raw()).map_err(|_| CapsuleError::Config {
        message: format!("kernel returned invalid pid {pid}"),
    })?;
    tracing::info!(
        pid,
        program = %cmd.program.display(),
        namespaces = ?cmd.namespaces.kinds(),
        "isolated process created"
    );
    Ok(pid)
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error: namespaces require Linux.
#[cfg(not(target_os = "linux"))]
pub fn spawn_isolated(_cmd: &IsolatedCommand) -> Result<u32> {
    Err(CapsuleError::Config {
        message: "Linux required for native container operations".into(),
    })
}

#[cfg(target_os = "linux")]
#[allow(clippy::print_stderr)]
fn child_fault(step: &str, err: &dyn std::fmt::Display) -> isize {
    eprintln!(
        "{}: {step} failed in new namespaces: {err}",
        capsule_common::constants::BIN_NAME
    );
    capsule_common::constants::EXIT_SETUP_FAULT as isize
}

/// Builds `KEY=VALUE` entries from the current environment with `overrides` applied.
fn build_env(overrides: &[(String, String)]) -> Result<Vec<CString>> {
    let mut entries = Vec::new();
    for (key, value) in std::env::vars_os() {
        if overrides.iter().any(|(name, _)| key.as_os_str() == OsStr::new(name)) {
            continue;
        }
        let mut entry = key.into_vec();
        entry.push(b'=');
        entry.extend_from_slice(value.as_bytes());
        entries.push(to_cstring(entry)?);
    }
    for (key, value) in overrides {
        entries.push(to_cstring(format!("{key}={value}"))?);
    }
    Ok(entries)
}

fn to_cstring(bytes: impl Into<Vec<u8>>) -> Result<CString> {
    CString::new(bytes).map_err(|e| CapsuleError::Config {
        message: format!("argument contains an interior NUL byte at {}", e.nul_position()),
    })
}
