//! Error Types for the Orientation Pipeline
//!
//! ## Design Philosophy
//!
//! None of these errors ever reach the caller from the per-sample path.
//! The pipeline and the calibration controller catch them locally and
//! turn them into diagnostics; the caller only sees a `StepOutcome`.
//! Errors are returned directly only where the caller supplies
//! configuration: a persisted gain string or a location fix.
//!
//! Like the rest of the crate the type is embedded friendly:
//!
//! 1. **Small Size**: every variant carries at most two floats.
//! 2. **No Heap Allocation**: every payload is a `Copy` scalar or enum.
//! 3. **Copy Semantics**: errors are cheap to store in the diagnostic log.
//!
//! ## Error Categories
//!
//! ### Transient Input Corruption
//! - `InvalidReading`: a sensor vector carries NaN or infinity
//!
//! ### Filter Health
//! - `FilterDiverged`: the attitude filter emitted non-finite angles
//!
//! ### Calibration
//! - `ReferenceUnavailable`: the compass reference had nothing to offer
//! - `ReferenceNotFinite`: the reference answered with NaN or infinity
//!
//! ### Configuration
//! - `GainOutOfRange` / `GainUnparseable`: persisted gain rejected on load
//! - `LocationOutOfRange`: latitude/longitude outside the globe

use core::fmt;

use thiserror_no_std::Error;

use crate::sensors::SensorKind;

/// Result type for tracking operations
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Tracking errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TrackingError {
    /// A sensor reading contained a non-finite component
    #[error("Invalid {sensor} reading: non-finite component")]
    InvalidReading {
        /// Sensor that produced the reading
        sensor: SensorKind,
    },

    /// The attitude filter produced non-finite Euler angles
    #[error("Attitude filter diverged ({consecutive} consecutive failures)")]
    FilterDiverged {
        /// Consecutive failed updates including this one
        consecutive: u32,
    },

    /// The heading reference could not provide a heading
    #[error("Heading reference unavailable")]
    ReferenceUnavailable,

    /// The heading reference returned NaN or infinity
    #[error("Heading reference returned a non-finite heading")]
    ReferenceNotFinite,

    /// Filter gain outside the accepted range
    #[error("Gain {value} outside range [{min}, {max}]")]
    GainOutOfRange {
        /// Rejected gain
        value: f32,
        /// Smallest accepted gain
        min: f32,
        /// Largest accepted gain
        max: f32,
    },

    /// Persisted gain text is not a finite decimal number
    #[error("Gain is not a finite decimal number")]
    GainUnparseable,

    /// Location fix outside valid latitude/longitude bounds
    #[error("Location ({latitude}, {longitude}) out of range")]
    LocationOutOfRange {
        /// Rejected latitude in degrees
        latitude: f64,
        /// Rejected longitude in degrees
        longitude: f64,
    },
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TrackingError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidReading { sensor } =>
                defmt::write!(fmt, "Invalid {} reading", sensor.name()),
            Self::FilterDiverged { consecutive } =>
                defmt::write!(fmt, "Filter diverged x{}", consecutive),
            Self::ReferenceUnavailable =>
                defmt::write!(fmt, "Reference unavailable"),
            Self::ReferenceNotFinite =>
                defmt::write!(fmt, "Reference not finite"),
            Self::GainOutOfRange { value, min, max } =>
                defmt::write!(fmt, "Gain {} outside [{}, {}]", value, min, max),
            Self::GainUnparseable =>
                defmt::write!(fmt, "Gain unparseable"),
            Self::LocationOutOfRange { latitude, longitude } =>
                defmt::write!(fmt, "Location ({}, {}) out of range", latitude, longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<TrackingError>() <= 24);
    }

    #[cfg(feature = "std")]
    #[test]
    fn display_names_sensor() {
        let err = TrackingError::InvalidReading { sensor: SensorKind::Magnetometer };
        assert_eq!(err.to_string(), "Invalid magnetometer reading: non-finite component");
    }
}
