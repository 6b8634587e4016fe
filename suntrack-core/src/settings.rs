//! Persisted filter gain
//!
//! The gain is the only value the core persists. It is stored as free-form
//! decimal text, so nothing guarantees what comes back on load:
//!
//! ```text
//! save:  any f32 ──clamp──→ [MIN_GAIN, MAX_GAIN] ──→ "0.1"
//! load:  "0.1"   ──parse──→ finite? in range? ──→ FilterGain
//!                               │ no
//!                               └──→ DEFAULT_GAIN (logged)
//! ```
//!
//! Out-of-range values are clamped when saving but rejected when loading:
//! a value outside the range on disk means the file was not written by us.

use core::fmt::Write;

use crate::constants::{DEFAULT_GAIN, MAX_GAIN, MIN_GAIN};
use crate::errors::{TrackingError, TrackingResult};

/// Longest encoded gain text
pub const ENCODED_GAIN_CAPACITY: usize = 16;

/// Attitude filter gain (beta), always finite and within range
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f32", into = "f32"))]
pub struct FilterGain(f32);

impl FilterGain {
    /// Validate a gain value
    pub fn new(value: f32) -> TrackingResult<Self> {
        if !value.is_finite() {
            return Err(TrackingError::GainUnparseable);
        }
        if !(MIN_GAIN..=MAX_GAIN).contains(&value) {
            return Err(TrackingError::GainOutOfRange {
                value,
                min: MIN_GAIN,
                max: MAX_GAIN,
            });
        }
        Ok(Self(value))
    }

    /// Clamp any value into range; NaN falls back to the default
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(MIN_GAIN, MAX_GAIN))
    }

    /// Strictly parse persisted gain text
    pub fn parse(text: &str) -> TrackingResult<Self> {
        let value: f32 = text
            .trim()
            .parse()
            .map_err(|_| TrackingError::GainUnparseable)?;
        Self::new(value)
    }

    /// Parse persisted gain text, falling back to the default on any problem
    pub fn load(text: &str) -> Self {
        match Self::parse(text) {
            Ok(gain) => gain,
            Err(err) => {
                log_warn!("Stored gain {:?} rejected ({}), using default {}", text, err, DEFAULT_GAIN);
                Self::default()
            }
        }
    }

    /// Encode for persistence
    pub fn encode(&self) -> heapless::String<ENCODED_GAIN_CAPACITY> {
        let mut text = heapless::String::new();
        // Shortest round-trip form of a value in [0.001, 1] is well under capacity
        let _ = write!(text, "{}", self.0);
        text
    }

    /// Clamp a raw value and encode it, as done when the operator saves
    pub fn encode_clamped(value: f32) -> heapless::String<ENCODED_GAIN_CAPACITY> {
        Self::clamped(value).encode()
    }

    /// Raw gain value
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for FilterGain {
    fn default() -> Self {
        Self(DEFAULT_GAIN)
    }
}

impl TryFrom<f32> for FilterGain {
    type Error = TrackingError;

    fn try_from(value: f32) -> TrackingResult<Self> {
        Self::new(value)
    }
}

impl From<FilterGain> for f32 {
    fn from(gain: FilterGain) -> f32 {
        gain.0
    }
}
