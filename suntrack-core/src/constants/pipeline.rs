//! Pipeline Constants
//!
//! Smoothing factor and the divergence-recovery protocol.

/// Default exponential smoothing factor.
///
/// Weight kept from the previous orientation each cycle; 0.2 keeps the
/// display steady while adding well under 100 ms of lag at 50 Hz.
pub const DEFAULT_SMOOTHING: f32 = 0.2;

/// Consecutive non-finite filter outputs before a full filter reset.
///
/// Ten samples is 200 ms at 50 Hz: long enough to ride out a single
/// corrupt triple, short enough that the freeze is barely visible.
pub const FAILURE_RESET_THRESHOLD: u32 = 10;

/// Capacity of the pipeline's diagnostic ring.
///
/// Oldest entries are dropped once full.
pub const DIAGNOSTIC_LOG_CAPACITY: usize = 32;
