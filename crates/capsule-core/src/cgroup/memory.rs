//! Memory resource control.
//!
//! The ceiling lives in a differently named file on each interface
//! generation; both take a plain byte count.

use std::path::Path;

use capsule_common::error::{CapsuleError, Result};
use capsule_common::types::MemoryLimit;

use super::CgroupVersion;

/// Returns the control file holding the hard memory ceiling.
#[must_use]
pub const fn limit_file(version: CgroupVersion) -> &'static str {
    match version {
        CgroupVersion::V2 => "memory.max",
        CgroupVersion::V1 => "memory.limit_in_bytes",
    }
}

/// Writes the hard memory ceiling for a domain.
///
/// # Errors
///
/// Returns an error if writing the control file fails.
pub fn set_memory_limit(domain: &Path, version: CgroupVersion, limit: MemoryLimit) -> Result<()> {
    let file = domain.join(limit_file(version));
    std::fs::write(&file, limit.bytes().to_string()).map_err(|e| {
        CapsuleError::ResourceControl {
            path: file.clone(),
            source: e,
        }
    })?;
    tracing::debug!(file = %file.display(), bytes = limit.bytes(), "memory limit set");
    Ok(())
}

/// Reads the memory ceiling back.
///
/// Returns `None` when the domain is unlimited (`max` on v2).
///
/// # Errors
///
/// Returns an error if the control file cannot be read or does not hold a number.
pub fn memory_limit(domain: &Path, version: CgroupVersion) -> Result<Option<u64>> {
    let file = domain.join(limit_file(version));
    let raw = std::fs::read_to_string(&file).map_err(|e| CapsuleError::ResourceControl {
        path: file.clone(),
        source: e,
    })?;
    let raw = raw.trim();
    if raw == "max" {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|e| CapsuleError::ResourceControl {
            path: file,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
}
