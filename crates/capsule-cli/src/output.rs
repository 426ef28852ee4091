//! Exit-status mapping and human-readable formatting for CLI output.

use std::process::ExitCode;

use capsule_common::error::CapsuleError;
use capsule_common::types::RunOutcome;

/// Exit status for a malformed invocation, matching the argument parser's.
const EXIT_USAGE: u8 = 2;

/// Converts a finished run into the process exit code.
#[must_use]
pub fn exit_code(outcome: RunOutcome) -> ExitCode {
    u8::try_from(outcome.code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Chooses the exit code for a fault that stopped the run.
#[must_use]
pub fn fault_exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<CapsuleError>() {
        Some(CapsuleError::Usage { .. }) => ExitCode::from(EXIT_USAGE),
        _ => exit_code(RunOutcome::SETUP_FAULT),
    }
}

/// Formats a byte count into a human-readable string (e.g., "128 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
