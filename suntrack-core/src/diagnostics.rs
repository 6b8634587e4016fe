//! Diagnostic events from the orientation pipeline
//!
//! ## Overview
//!
//! Every recoverable problem the pipeline absorbs leaves a trace here. These
//! are observability signals, not control flow: the caller may drain and
//! display them, ship them off-device, or ignore them entirely.
//!
//! ```text
//! Sensor callbacks ─→ Pipeline ─┬─→ Orientation
//!                               └─→ DiagnosticLog (bounded, oldest dropped)
//! ```
//!
//! ## Memory Model
//!
//! The log is a fixed-capacity `heapless::Deque`; when it is full the oldest
//! entry is evicted so the newest signal is never lost.

use heapless::Deque;

use crate::constants::DIAGNOSTIC_LOG_CAPACITY;
use crate::errors::TrackingError;
use crate::sensors::SensorKind;

/// One diagnostic signal
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Diagnostic {
    /// A triple was dropped because `sensor` held a non-finite value
    InvalidReadingSkipped {
        /// Offending sensor
        sensor: SensorKind,
    },
    /// The filter emitted non-finite angles; the frame was dropped
    FilterFailure {
        /// Consecutive failures so far
        consecutive: u32,
    },
    /// Filter state was discarded and rebuilt
    FilterReset {
        /// Estimator generation after the reset
        generation: u32,
    },
    /// Gain changed, forcing a filter rebuild
    GainChanged {
        /// New gain
        gain: f32,
    },
    /// A reference heading request went out
    CalibrationStarted,
    /// A new heading offset was stored
    CalibrationApplied {
        /// Offset in (-180, 180]
        offset_degrees: f32,
        /// Whether the reference was flipped for high pitch
        flipped: bool,
    },
    /// A calibration attempt ended without touching the offset
    CalibrationAbandoned {
        /// Why
        #[cfg_attr(feature = "serde", serde(skip))]
        reason: TrackingError,
    },
}

/// Bounded ring of recent diagnostics
#[derive(Debug)]
pub struct DiagnosticLog<const N: usize = DIAGNOSTIC_LOG_CAPACITY> {
    entries: Deque<Diagnostic, N>,
    dropped: u32,
}

impl<const N: usize> DiagnosticLog<N> {
    /// Empty log
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
            dropped: 0,
        }
    }

    /// Append, evicting the oldest entry when full
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if self.entries.is_full() {
            self.entries.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail: a slot was freed above if needed
        let _ = self.entries.push_back(diagnostic);
    }

    /// Remove and yield every entry, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = Diagnostic> + '_ {
        core::iter::from_fn(move || self.entries.pop_front())
    }

    /// Iterate without removing
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Entries currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries evicted since creation
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> Default for DiagnosticLog<N> {
    fn default() -> Self {
        Self::new()
    }
}
