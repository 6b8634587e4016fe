//! Heading calibration against an independent reference
//!
//! ## Overview
//!
//! The attitude filter has no notion of true north: its heading is only as
//! good as the magnetic field it was fed. The calibration controller asks an
//! external [`HeadingReference`] (a platform compass, a GNSS course, a user
//! fix) for a heading now and then, and stores the difference as an offset
//! that is added to every subsequent filter heading.
//!
//! ## Lifecycle
//!
//! ```text
//!            should_calibrate()          poll() → Ok / Err
//!   Idle ──────────────────────→ Pending ───────────────────→ Idle
//!     ↑      calibrate()            │                          │
//!     │                             └─ poll() → WouldBlock ─┐  │
//!     │                                  (stay Pending)  ←──┘  │
//!     └────────────────────────────────────────────────────────┘
//! ```
//!
//! - The first orientation ever produced triggers one attempt regardless of
//!   pitch.
//! - Afterwards an attempt starts only when the device is level, the
//!   calibration interval has elapsed since the last success and the retry
//!   interval has elapsed since the last attempt of any outcome.
//! - At most one attempt is in flight; triggers while pending are ignored.
//! - An attempt that started before a filter reset is still applied when it
//!   completes. The stale generation is logged.
//!
//! ## Reference Seam
//!
//! The reference is non-blocking in the `nb` style: [`HeadingReference::request`]
//! starts a query and [`HeadingReference::poll`] is called once per pipeline
//! step until it stops returning `WouldBlock`. No executor is involved.

use crate::angle::{heading_difference, normalize_signed, HALF_CIRCLE_DEG};
use crate::constants::{
    CALIBRATION_INTERVAL_MS, CALIBRATION_RETRY_MS, LEVEL_PITCH_THRESHOLD_DEG, REFERENCE_FLIP_PITCH_DEG,
};
use crate::errors::TrackingError;
use crate::time::{elapsed_ms, Timestamp};

/// Why a reference could not deliver a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceError {
    /// No heading available right now
    Unavailable,
}

/// An independent heading source queried on demand
pub trait HeadingReference {
    /// Start a query; called once per calibration attempt
    fn request(&mut self);

    /// Heading in degrees once the query completes
    fn poll(&mut self) -> nb::Result<f32, ReferenceError>;
}

impl<T: HeadingReference + ?Sized> HeadingReference for &mut T {
    fn request(&mut self) {
        (**self).request()
    }

    fn poll(&mut self) -> nb::Result<f32, ReferenceError> {
        (**self).poll()
    }
}

/// Reference for devices without one; every attempt is abandoned
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReference;

impl HeadingReference for NoReference {
    fn request(&mut self) {}

    fn poll(&mut self) -> nb::Result<f32, ReferenceError> {
        Err(nb::Error::Other(ReferenceError::Unavailable))
    }
}

/// Calibration scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationConfig {
    /// Minimum time between successful calibrations
    pub interval_ms: u64,
    /// Minimum time between attempts, failed ones included
    pub retry_interval_ms: u64,
    /// |pitch| must be below this for a scheduled attempt
    pub level_pitch_threshold_deg: f32,
    /// |pitch| above this flips the reference by 180°
    pub flip_pitch_threshold_deg: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            interval_ms: CALIBRATION_INTERVAL_MS,
            retry_interval_ms: CALIBRATION_RETRY_MS,
            level_pitch_threshold_deg: LEVEL_PITCH_THRESHOLD_DEG,
            flip_pitch_threshold_deg: REFERENCE_FLIP_PITCH_DEG,
        }
    }
}

/// Externally visible calibration state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalibrationState {
    /// Offset in (-180, 180] added to the filter heading
    pub offset_degrees: f32,
    /// When the offset was last refreshed by a reference
    pub last_calibration: Option<Timestamp>,
    /// When the last attempt of any outcome started
    pub last_attempt: Option<Timestamp>,
    /// Whether an attempt is awaiting the reference
    pub in_progress: bool,
}

/// Snapshot taken when an attempt starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCalibration {
    /// Filter heading in degrees, before offset
    pub filter_heading: f32,
    /// Pitch in degrees at request time
    pub pitch_degrees: f32,
    /// Request time
    pub requested_at: Timestamp,
    /// Estimator generation at request time
    pub generation: u32,
}

/// Result of polling an attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    /// Nothing in flight
    Idle,
    /// Waiting on the reference
    Pending,
    /// A new offset was stored
    Applied {
        /// Stored offset
        offset_degrees: f32,
        /// Reference was flipped for high pitch
        flipped: bool,
    },
    /// Attempt ended, prior offset untouched
    Abandoned(TrackingError),
}

/// Schedules calibration attempts and owns the heading offset
#[derive(Debug, Clone)]
pub struct CalibrationController {
    config: CalibrationConfig,
    state: CalibrationState,
    pending: Option<PendingCalibration>,
    bootstrapped: bool,
}

impl CalibrationController {
    /// Controller with no offset and no attempt made yet
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            state: CalibrationState::default(),
            pending: None,
            bootstrapped: false,
        }
    }

    /// Whether a new attempt should start now
    pub fn should_calibrate(&self, now: Timestamp, pitch_degrees: f32) -> bool {
        if self.pending.is_some() {
            return false;
        }
        if !self.bootstrapped {
            return true;
        }

        let level = libm::fabsf(pitch_degrees) < self.config.level_pitch_threshold_deg;
        let due = match self.state.last_calibration {
            Some(last) => elapsed_ms(last, now) >= self.config.interval_ms,
            None => true,
        };
        let backed_off = match self.state.last_attempt {
            Some(last) => elapsed_ms(last, now) >= self.config.retry_interval_ms,
            None => true,
        };
        level && due && backed_off
    }

    /// Start an attempt; ignored while one is already pending
    pub fn calibrate<R: HeadingReference>(
        &mut self,
        reference: &mut R,
        now: Timestamp,
        filter_heading: f32,
        pitch_degrees: f32,
        generation: u32,
    ) -> bool {
        if self.pending.is_some() {
            log_debug!("Calibration already in flight, trigger ignored");
            return false;
        }

        self.pending = Some(PendingCalibration {
            filter_heading,
            pitch_degrees,
            requested_at: now,
            generation,
        });
        self.state.in_progress = true;
        self.state.last_attempt = Some(now);
        self.bootstrapped = true;
        reference.request();
        true
    }

    /// Advance an in-flight attempt
    pub fn poll<R: HeadingReference>(
        &mut self,
        reference: &mut R,
        now: Timestamp,
        current_generation: u32,
    ) -> CalibrationOutcome {
        let Some(pending) = self.pending else {
            return CalibrationOutcome::Idle;
        };

        let result = match reference.poll() {
            Err(nb::Error::WouldBlock) => return CalibrationOutcome::Pending,
            Ok(heading) if heading.is_finite() => Ok(heading),
            Ok(_) => Err(TrackingError::ReferenceNotFinite),
            Err(nb::Error::Other(ReferenceError::Unavailable)) => Err(TrackingError::ReferenceUnavailable),
        };

        self.pending = None;
        self.state.in_progress = false;

        match result {
            Ok(reference_heading) => {
                if pending.generation != current_generation {
                    log_debug!(
                        "Calibration requested at generation {} applied at generation {}",
                        pending.generation,
                        current_generation
                    );
                }
                let (offset, flipped) = self.compute_offset(&pending, reference_heading);
                self.state.offset_degrees = offset;
                self.state.last_calibration = Some(now);
                log_info!(
                    "Heading offset {} deg (reference {}, filter {}, flipped {})",
                    offset,
                    reference_heading,
                    pending.filter_heading,
                    flipped
                );
                CalibrationOutcome::Applied {
                    offset_degrees: offset,
                    flipped,
                }
            }
            Err(err) => {
                log_debug!("Calibration abandoned: {}", err);
                CalibrationOutcome::Abandoned(err)
            }
        }
    }

    /// Offset between the filter heading and a (possibly flipped) reference
    pub fn compute_offset(&self, pending: &PendingCalibration, reference_heading: f32) -> (f32, bool) {
        let flipped = libm::fabsf(pending.pitch_degrees) > self.config.flip_pitch_threshold_deg;
        let reference_heading = if flipped {
            reference_heading + HALF_CIRCLE_DEG
        } else {
            reference_heading
        };
        (heading_difference(pending.filter_heading, reference_heading), flipped)
    }

    /// Store a caller-supplied correction, e.g. a known declination
    pub fn set_offset(&mut self, offset_degrees: f32) {
        if offset_degrees.is_finite() {
            self.state.offset_degrees = normalize_signed(offset_degrees);
        }
    }

    /// Current offset in (-180, 180]
    pub fn offset(&self) -> f32 {
        self.state.offset_degrees
    }

    /// Snapshot of the calibration state
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// The in-flight attempt, if any
    pub fn pending(&self) -> Option<&PendingCalibration> {
        self.pending.as_ref()
    }

    /// Scheduling parameters
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference that answers each request from a script
    struct Scripted {
        answers: [Option<nb::Result<f32, ReferenceError>>; 4],
        next: usize,
        requests: u32,
    }

    impl Scripted {
        fn new(answers: [Option<nb::Result<f32, ReferenceError>>; 4]) -> Self {
            Self { answers, next: 0, requests: 0 }
        }
    }

    impl HeadingReference for Scripted {
        fn request(&mut self) {
            self.requests += 1;
        }

        fn poll(&mut self) -> nb::Result<f32, ReferenceError> {
            let answer = self.answers.get_mut(self.next).and_then(Option::take);
            self.next += 1;
            answer.unwrap_or(Err(nb::Error::Other(ReferenceError::Unavailable)))
        }
    }

    #[test]
    fn bootstrap_ignores_pitch() {
        let controller = CalibrationController::default();
        assert!(controller.should_calibrate(0, 80.0));
    }

    #[test]
    fn scheduled_attempts_need_level_and_interval() {
        let mut controller = CalibrationController::default();
        let mut reference = Scripted::new([Some(Ok(100.0)), None, None, None]);

        controller.calibrate(&mut reference, 0, 90.0, 0.0, 0);
        assert!(!controller.should_calibrate(0, 0.0), "pending blocks triggers");
        assert!(matches!(controller.poll(&mut reference, 10, 0), CalibrationOutcome::Applied { .. }));

        assert!(!controller.should_calibrate(29_999, 0.0));
        assert!(!controller.should_calibrate(40_000, 20.0));
        assert!(controller.should_calibrate(30_010, 5.0));
        assert!(controller.should_calibrate(40_000, -14.9));
    }

    #[test]
    fn offset_is_reference_minus_filter() {
        let mut controller = CalibrationController::default();
        let mut reference = Scripted::new([Some(Ok(10.0)), None, None, None]);

        controller.calibrate(&mut reference, 0, 350.0, 5.0, 0);
        let outcome = controller.poll(&mut reference, 5, 0);

        assert_eq!(outcome, CalibrationOutcome::Applied { offset_degrees: 20.0, flipped: false });
        assert_eq!(controller.offset(), 20.0);
        assert_eq!(controller.state().last_calibration, Some(5));
        assert!(!controller.state().in_progress);
    }

    #[test]
    fn high_pitch_flips_reference() {
        let mut controller = CalibrationController::default();
        let mut reference = Scripted::new([Some(Ok(30.0)), None, None, None]);

        controller.calibrate(&mut reference, 0, 0.0, 60.0, 0);
        let outcome = controller.poll(&mut reference, 0, 0);

        // 30 + 180 = 210 -> -150
        assert_eq!(outcome, CalibrationOutcome::Applied { offset_degrees: -150.0, flipped: true });
    }

    #[test]
    fn unavailable_keeps_prior_offset() {
        let mut controller = CalibrationController::default();
        controller.set_offset(12.0);
        let mut reference = Scripted::new([None, None, None, None]);

        controller.calibrate(&mut reference, 0, 0.0, 0.0, 0);
        assert_eq!(
            controller.poll(&mut reference, 0, 0),
            CalibrationOutcome::Abandoned(TrackingError::ReferenceUnavailable)
        );
        assert_eq!(controller.offset(), 12.0);
        assert_eq!(controller.state().last_calibration, None);
        assert!(!controller.state().in_progress);
    }

    #[test]
    fn failed_attempts_back_off() {
        let mut controller = CalibrationController::default();
        let mut reference = NoReference;

        controller.calibrate(&mut reference, 0, 0.0, 0.0, 0);
        controller.poll(&mut reference, 0, 0);
        assert_eq!(controller.state().last_attempt, Some(0));
        assert_eq!(controller.state().last_calibration, None);

        assert!(!controller.should_calibrate(0, 0.0));
        assert!(!controller.should_calibrate(CALIBRATION_RETRY_MS - 1, 0.0));
        assert!(controller.should_calibrate(CALIBRATION_RETRY_MS, 0.0));
    }

    #[test]
    fn non_finite_reference_abandoned() {
        let mut controller = CalibrationController::default();
        let mut reference = Scripted::new([Some(Ok(f32::NAN)), None, None, None]);

        controller.calibrate(&mut reference, 0, 0.0, 0.0, 0);
        assert_eq!(
            controller.poll(&mut reference, 0, 0),
            CalibrationOutcome::Abandoned(TrackingError::ReferenceNotFinite)
        );
        assert_eq!(controller.offset(), 0.0);
    }

    #[test]
    fn pending_survives_polls_and_one_flight_only() {
        let mut controller = CalibrationController::default();
        let mut reference = Scripted::new([
            Some(Err(nb::Error::WouldBlock)),
            Some(Err(nb::Error::WouldBlock)),
            Some(Ok(45.0)),
            None,
        ]);

        assert!(controller.calibrate(&mut reference, 0, 0.0, 0.0, 0));
        assert!(!controller.calibrate(&mut reference, 1, 0.0, 0.0, 0));
        assert_eq!(reference.requests, 1);

        assert_eq!(controller.poll(&mut reference, 1, 0), CalibrationOutcome::Pending);
        assert_eq!(controller.poll(&mut reference, 2, 0), CalibrationOutcome::Pending);
        assert!(controller.state().in_progress);

        // Filter was reset in between; the result still lands
        let outcome = controller.poll(&mut reference, 3, 1);
        assert_eq!(outcome, CalibrationOutcome::Applied { offset_degrees: 45.0, flipped: false });
        assert_eq!(controller.poll(&mut reference, 4, 1), CalibrationOutcome::Idle);
    }

    #[test]
    fn set_offset_normalizes() {
        let mut controller = CalibrationController::default();
        controller.set_offset(190.0);
        assert_eq!(controller.offset(), -170.0);
        controller.set_offset(f32::NAN);
        assert_eq!(controller.offset(), -170.0);
    }

    #[test]
    fn no_reference_always_unavailable() {
        let mut reference = NoReference;
        reference.request();
        assert_eq!(reference.poll(), Err(nb::Error::Other(ReferenceError::Unavailable)));
    }
}
