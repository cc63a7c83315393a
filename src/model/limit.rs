//! Byte thresholds derived from a megabyte budget.

use crate::error::{Result, ShrinkError};

/// Bytes per "megabyte" as mail providers count them (decimal, not MiB).
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// Fraction of the nominal limit actually targeted, leaving 5% headroom.
pub const SAFETY_MARGIN: f64 = 0.95;

/// Maximum total attachment size, in bytes, with the safety margin applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimit {
    mb: f64,
    bytes: f64,
}

impl SizeLimit {
    /// Build a limit from a megabyte value: `mb * 1_000_000 * 0.95`.
    pub fn from_mb(mb: f64) -> Result<Self> {
        if !mb.is_finite() || mb <= 0.0 {
            return Err(ShrinkError::InvalidConfig(format!(
                "size limit must be a positive number of MB, got {mb}"
            )));
        }
        Ok(Self {
            mb,
            bytes: mb * BYTES_PER_MB * SAFETY_MARGIN,
        })
    }

    /// The nominal megabyte value this limit was built from.
    pub fn mb(&self) -> f64 {
        self.mb
    }

    /// The effective threshold in bytes (fractional for odd MB values).
    pub fn bytes(&self) -> f64 {
        self.bytes
    }

    /// `true` if `total` is strictly below the threshold.
    pub fn fits(&self, total: u64) -> bool {
        (total as f64) < self.bytes
    }
}
