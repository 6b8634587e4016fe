//! Constants for SunTrack Core
//!
//! Every tuning value used by the filter, the pipeline, calibration and
//! the solar table lives here, with its unit in the name and a note on
//! where it comes from.
//!
//! ## Organization
//!
//! - **Filter**: attitude filter gain and sample timing
//! - **Pipeline**: smoothing and failure/reset thresholds
//! - **Calibration**: reference reconciliation windows
//! - **Solar**: ephemeris and table geometry
//! - **Time**: unit conversions

/// Attitude filter gain bounds and sample interval.
pub mod filter;

/// Smoothing and divergence-recovery thresholds.
pub mod pipeline;

/// Heading reference calibration windows.
pub mod calibration;

/// Solar ephemeris and table geometry.
pub mod solar;

/// Time unit conversions.
pub mod time;

pub use filter::{DEFAULT_GAIN, MIN_GAIN, MAX_GAIN, DEFAULT_SAMPLE_INTERVAL_S};
pub use pipeline::{DEFAULT_SMOOTHING, FAILURE_RESET_THRESHOLD, DIAGNOSTIC_LOG_CAPACITY};
pub use calibration::{
    CALIBRATION_INTERVAL_MS, CALIBRATION_RETRY_MS, LEVEL_PITCH_THRESHOLD_DEG, REFERENCE_FLIP_PITCH_DEG,
};
pub use solar::{HEADING_BUCKETS, MINUTES_PER_TABLE};
pub use time::{MS_PER_SECOND, MS_PER_MINUTE, MS_PER_DAY};
