//! Attitude Filter Constants
//!
//! Parameters of the gradient-descent MARG filter. The gain (beta) is
//! the only operator-facing knob; the sample interval is fixed by the
//! sensor delivery rate.

/// Default filter gain (beta).
///
/// Balances drift correction against accelerometer/magnetometer noise
/// for a hand-held device at 50 Hz.
///
/// Source: Madgwick, "An efficient orientation filter for IMUs and MARG arrays"
pub const DEFAULT_GAIN: f32 = 0.1;

/// Smallest accepted gain.
///
/// Below this the filter effectively stops correcting gyro drift.
pub const MIN_GAIN: f32 = 0.001;

/// Largest accepted gain.
///
/// Above this the estimate follows every accelerometer jolt.
pub const MAX_GAIN: f32 = 1.0;

/// Nominal sensor sample interval in seconds (50 Hz).
///
/// Source: platform "game" sensor delay, 20 ms
pub const DEFAULT_SAMPLE_INTERVAL_S: f32 = 0.02;
