//! # Match Thresholds
//!
//! The two similarity cut-offs that band each source control into
//! Full / Partial / None. Validated at construction so the matcher never
//! sees an inverted or out-of-range pair.

use serde::{Deserialize, Serialize};

use crate::error::ThresholdError;

/// Default cut-off for a full match.
pub const DEFAULT_FULL: f32 = 0.85;

/// Default cut-off for a partial match.
pub const DEFAULT_PARTIAL: f32 = 0.65;

/// Validated threshold pair with `0 <= partial <= full <= 1`.
///
/// Values are `f32` so comparisons happen in the same domain as the
/// similarity matrix. A score exactly equal to a threshold clears it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdFields")]
pub struct Thresholds {
    full: f32,
    partial: f32,
}

impl Thresholds {
    /// Validate and build a threshold pair.
    pub fn new(full: f32, partial: f32) -> Result<Self, ThresholdError> {
        check_range("full", full)?;
        check_range("partial", partial)?;
        if partial > full {
            return Err(ThresholdError::Inverted { full, partial });
        }
        Ok(Self { full, partial })
    }

    /// Full-match cut-off.
    pub fn full(&self) -> f32 {
        self.full
    }

    /// Partial-match cut-off.
    pub fn partial(&self) -> f32 {
        self.partial
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            full: DEFAULT_FULL,
            partial: DEFAULT_PARTIAL,
        }
    }
}

fn check_range(name: &'static str, value: f32) -> Result<(), ThresholdError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ThresholdError::OutOfRange { name, value })
    }
}

#[derive(Deserialize)]
struct ThresholdFields {
    #[serde(default = "default_full")]
    full: f32,
    #[serde(default = "default_partial")]
    partial: f32,
}

fn default_full() -> f32 {
    DEFAULT_FULL
}

fn default_partial() -> f32 {
    DEFAULT_PARTIAL
}

impl TryFrom<ThresholdFields> for Thresholds {
    type Error = ThresholdError;

    fn try_from(f: ThresholdFields) -> Result<Self, Self::Error> {
        Thresholds::new(f.full, f.partial)
    }
}
