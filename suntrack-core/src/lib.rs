//! Orientation fusion and solar lookup for SunTrack
//!
//! Turns raw gyroscope, accelerometer and magnetometer streams into a
//! stable heading/pitch/roll, keeps that heading aligned with an
//! independent compass reference, and maps it onto a per-location
//! solar elevation table.
//!
//! Key constraints:
//! - Runs without `std` (all math through `libm`)
//! - No heap allocation anywhere in the update path
//! - Bad input never panics; the worst case is a briefly frozen orientation
//!
//! ```no_run
//! use suntrack_core::{
//!     OrientationPipeline, PipelineConfig, SensorReading, SolarTable,
//!     calibration::NoReference, time::FixedTime,
//! };
//!
//! let mut pipeline = OrientationPipeline::new(
//!     PipelineConfig::default(),
//!     NoReference,
//!     FixedTime::new(0),
//! );
//!
//! pipeline.on_gyroscope(SensorReading::new(0.0, 0.0, 0.0));
//! pipeline.on_magnetometer(SensorReading::new(20.0, 0.0, -40.0));
//! pipeline.on_accelerometer(SensorReading::new(0.0, 0.0, 1.0));
//!
//! let table = SolarTable::generate(51.5, -0.1, 1_718_841_600_000).unwrap();
//! if let Some(sun) = pipeline.solar_position(&table) {
//!     // sun.elevation_degrees at the bearing the device points to
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod angle;
pub mod calibration;
pub mod constants;
pub mod diagnostics;
pub mod errors;
pub mod estimator;
pub mod orientation;
pub mod pipeline;
pub mod sensors;
pub mod settings;
pub mod solar;
pub mod time;

// Public API
pub use calibration::{CalibrationConfig, HeadingReference, NoReference};
pub use diagnostics::Diagnostic;
pub use errors::{TrackingError, TrackingResult};
pub use estimator::{AttitudeEstimator, MadgwickFilter, Quaternion};
pub use orientation::{EulerAngles, Orientation};
pub use pipeline::{OrientationPipeline, PipelineConfig, PipelineState, StepOutcome};
pub use sensors::{SensorKind, SensorReading};
pub use settings::FilterGain;
pub use solar::{sun_position, SolarPosition, SolarTable, SolarTableEntry, SunPosition};
pub use time::{FixedTime, TimeSource, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
