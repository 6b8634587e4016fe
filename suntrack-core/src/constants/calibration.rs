//! Calibration Constants
//!
//! Windows controlling when the filter heading is reconciled against the
//! independent compass reference.

/// Minimum time between successful calibrations (milliseconds).
pub const CALIBRATION_INTERVAL_MS: u64 = 30_000;

/// Minimum time between attempts of any outcome (milliseconds).
///
/// Bounds reference queries while the reference keeps failing.
pub const CALIBRATION_RETRY_MS: u64 = 5_000;

/// Maximum |pitch| in degrees for the device to count as level.
///
/// Reference compasses degrade quickly as the device tilts; only level
/// samples are folded into the offset.
pub const LEVEL_PITCH_THRESHOLD_DEG: f32 = 15.0;

/// |pitch| in degrees beyond which the reference heading is flipped 180°.
///
/// Platform rotation-vector compasses report a heading rotated by 180°
/// once the device is held more upright than this.
pub const REFERENCE_FLIP_PITCH_DEG: f32 = 45.0;
