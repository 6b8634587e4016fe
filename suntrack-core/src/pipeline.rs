//! Orientation pipeline: sensor callbacks in, smoothed orientation out
//!
//! ## Overview
//!
//! ```text
//! on_gyroscope ─────┐
//! on_accelerometer ─┼─→ LatestReadings ─→ validate ─→ estimator.update
//! on_magnetometer ──┘                                     │
//!                                                         ▼
//!          Orientation ←─ smooth ←─ apply offset ←─ calibration ←─ Euler (deg)
//! ```
//!
//! Every sample from any sensor drives one full step. The step runs to
//! completion under `&mut self`, so there is only ever one update in
//! flight per pipeline.
//!
//! ## State Machine
//!
//! ```text
//!  WaitingForSensors ──(all three seen)──→ Running ←──────────┐
//!                                            │  ↑             │
//!                                 non-finite │  │ finite      │
//!                                            ▼  │             │
//!                                          Degraded ──(N in a row)──→ reset
//! ```
//!
//! - A reading with NaN or infinity skips the step without touching any
//!   state beyond the stored reading.
//! - A step whose Euler angles come back non-finite is dropped and counted.
//!   After `failure_threshold` consecutive drops the estimator is rebuilt
//!   from scratch and the counter cleared.
//! - The last good orientation survives a reset and anchors smoothing for
//!   the first frame from the fresh filter.

use crate::angle::{apply_offset, smooth_orientation};
use crate::calibration::{
    CalibrationConfig, CalibrationController, CalibrationOutcome, CalibrationState, HeadingReference,
};
use crate::constants::{
    DEFAULT_SAMPLE_INTERVAL_S, DEFAULT_SMOOTHING, DIAGNOSTIC_LOG_CAPACITY, FAILURE_RESET_THRESHOLD,
};
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::errors::TrackingError;
use crate::estimator::{AttitudeEstimator, MadgwickFilter};
use crate::orientation::Orientation;
use crate::sensors::{LatestReadings, SensorKind, SensorReading, Validatable};
use crate::settings::FilterGain;
use crate::solar::{SolarPosition, SolarTable};
use crate::time::TimeSource;

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Attitude filter gain
    pub gain: FilterGain,
    /// Fixed estimator step in seconds
    pub sample_interval_s: f32,
    /// Weight kept from the prior orientation, [0, 1]
    pub smoothing: f32,
    /// Consecutive non-finite outputs before the estimator is rebuilt
    pub failure_threshold: u32,
    /// Calibration scheduling
    pub calibration: CalibrationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gain: FilterGain::default(),
            sample_interval_s: DEFAULT_SAMPLE_INTERVAL_S,
            smoothing: DEFAULT_SMOOTHING,
            failure_threshold: FAILURE_RESET_THRESHOLD,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Builder: set gain
    pub fn with_gain(mut self, gain: FilterGain) -> Self {
        self.gain = gain;
        self
    }

    /// Builder: set sample interval; non-positive or non-finite values are ignored
    pub fn with_sample_interval(mut self, seconds: f32) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            self.sample_interval_s = seconds;
        }
        self
    }

    /// Builder: set smoothing, clamped into [0, 1]
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = if smoothing.is_nan() {
            DEFAULT_SMOOTHING
        } else {
            smoothing.clamp(0.0, 1.0)
        };
        self
    }

    /// Builder: set failure threshold (at least 1)
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Builder: set calibration parameters
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }
}

/// Where the pipeline is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PipelineState {
    /// At least one sensor has not reported yet
    WaitingForSensors,
    /// Last step produced a finite orientation
    Running,
    /// Recent steps produced non-finite output
    Degraded,
}

/// What one sensor callback did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Reading stored; not every sensor has reported yet
    WaitingForSensors,
    /// Triple rejected for a non-finite component
    Skipped(SensorKind),
    /// Estimator output was non-finite and dropped
    Degraded {
        /// Failures in a row, this one included
        consecutive_failures: u32,
    },
    /// Failure threshold reached; estimator rebuilt
    Reset {
        /// Estimator generation after the rebuild
        generation: u32,
    },
    /// New orientation published
    Updated(Orientation),
}

/// Fuses sensor callbacks into a calibrated, smoothed orientation
pub struct OrientationPipeline<R, C, E = MadgwickFilter> {
    config: PipelineConfig,
    estimator: E,
    latest: LatestReadings,
    orientation: Option<Orientation>,
    state: PipelineState,
    consecutive_failures: u32,
    reset_count: u32,
    calibration: CalibrationController,
    reference: R,
    clock: C,
    diagnostics: DiagnosticLog<DIAGNOSTIC_LOG_CAPACITY>,
}

impl<R: HeadingReference, C: TimeSource> OrientationPipeline<R, C, MadgwickFilter> {
    /// Pipeline backed by a [`MadgwickFilter`] built from `config`
    pub fn new(config: PipelineConfig, reference: R, clock: C) -> Self {
        let estimator = MadgwickFilter::new(config.gain.value(), config.sample_interval_s);
        Self::with_estimator(config, estimator, reference, clock)
    }
}

impl<R: HeadingReference, C: TimeSource, E: AttitudeEstimator> OrientationPipeline<R, C, E> {
    /// Pipeline around an existing estimator, used as-is until the first reset
    pub fn with_estimator(config: PipelineConfig, estimator: E, reference: R, clock: C) -> Self {
        Self {
            calibration: CalibrationController::new(config.calibration),
            config,
            estimator,
            latest: LatestReadings::new(),
            orientation: None,
            state: PipelineState::WaitingForSensors,
            consecutive_failures: 0,
            reset_count: 0,
            reference,
            clock,
            diagnostics: DiagnosticLog::new(),
        }
    }

    /// Gyroscope callback, rad/s
    pub fn on_gyroscope(&mut self, reading: SensorReading) -> StepOutcome {
        self.on_sample(SensorKind::Gyroscope, reading)
    }

    /// Accelerometer callback
    pub fn on_accelerometer(&mut self, reading: SensorReading) -> StepOutcome {
        self.on_sample(SensorKind::Accelerometer, reading)
    }

    /// Magnetometer callback
    pub fn on_magnetometer(&mut self, reading: SensorReading) -> StepOutcome {
        self.on_sample(SensorKind::Magnetometer, reading)
    }

    /// Store a reading and run one step
    pub fn on_sample(&mut self, sensor: SensorKind, reading: SensorReading) -> StepOutcome {
        self.latest.store(sensor, reading);

        let Some(triple) = self.latest.triple() else {
            return StepOutcome::WaitingForSensors;
        };
        if self.state == PipelineState::WaitingForSensors {
            log_info!("All sensors reporting, pipeline running");
            self.state = PipelineState::Running;
        }

        if let Err(TrackingError::InvalidReading { sensor }) = triple.validate() {
            log_debug!("Skipping update: non-finite {} reading", sensor);
            self.diagnostics.record(Diagnostic::InvalidReadingSkipped { sensor });
            return StepOutcome::Skipped(sensor);
        }

        self.estimator
            .update(&triple.gyroscope, &triple.accelerometer, &triple.magnetometer);
        let angles = self.estimator.euler_angles();
        if !angles.is_valid() {
            return self.record_failure();
        }

        self.consecutive_failures = 0;
        self.state = PipelineState::Running;

        let raw = Orientation::from_euler_degrees(angles.to_degrees());
        self.run_calibration(&raw);

        let corrected = Orientation::new(
            apply_offset(raw.heading(), self.calibration.offset()),
            raw.pitch(),
            raw.roll(),
        );
        let next = match self.orientation {
            Some(prior) => smooth_orientation(&prior, &corrected, self.config.smoothing),
            None => corrected,
        };
        self.orientation = Some(next);
        StepOutcome::Updated(next)
    }

    fn record_failure(&mut self) -> StepOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let consecutive = self.consecutive_failures;
        log_warn!("{}", TrackingError::FilterDiverged { consecutive });
        self.diagnostics.record(Diagnostic::FilterFailure { consecutive });

        if consecutive >= self.config.failure_threshold {
            self.reset();
            return StepOutcome::Reset {
                generation: self.estimator.generation(),
            };
        }

        self.state = PipelineState::Degraded;
        StepOutcome::Degraded {
            consecutive_failures: consecutive,
        }
    }

    fn run_calibration(&mut self, raw: &Orientation) {
        let now = self.clock.now();
        let generation = self.estimator.generation();

        if self.calibration.should_calibrate(now, raw.pitch())
            && self
                .calibration
                .calibrate(&mut self.reference, now, raw.heading(), raw.pitch(), generation)
        {
            self.diagnostics.record(Diagnostic::CalibrationStarted);
        }

        match self.calibration.poll(&mut self.reference, now, generation) {
            CalibrationOutcome::Applied { offset_degrees, flipped } => {
                self.diagnostics.record(Diagnostic::CalibrationApplied { offset_degrees, flipped });
            }
            CalibrationOutcome::Abandoned(reason) => {
                self.diagnostics.record(Diagnostic::CalibrationAbandoned { reason });
            }
            CalibrationOutcome::Idle | CalibrationOutcome::Pending => {}
        }
    }

    /// Rebuild the estimator with the current gain and interval
    pub fn reset(&mut self) {
        self.estimator
            .reinitialize(self.config.gain.value(), self.config.sample_interval_s);
        self.consecutive_failures = 0;
        self.reset_count = self.reset_count.saturating_add(1);
        if self.state == PipelineState::Degraded {
            self.state = PipelineState::Running;
        }

        let generation = self.estimator.generation();
        log_warn!("Attitude filter reset (generation {})", generation);
        self.diagnostics.record(Diagnostic::FilterReset { generation });
    }

    /// Change the gain; the estimator restarts from scratch
    pub fn set_gain(&mut self, gain: FilterGain) {
        self.config.gain = gain;
        self.estimator
            .reinitialize(gain.value(), self.config.sample_interval_s);
        self.consecutive_failures = 0;
        if self.state == PipelineState::Degraded {
            self.state = PipelineState::Running;
        }

        log_info!("Filter gain set to {}", gain.value());
        self.diagnostics.record(Diagnostic::GainChanged { gain: gain.value() });
    }

    /// Store a caller-supplied heading correction, e.g. magnetic declination
    pub fn set_heading_offset(&mut self, offset_degrees: f32) {
        self.calibration.set_offset(offset_degrees);
    }

    /// Sun time and elevation at the current heading
    pub fn solar_position(&self, table: &SolarTable) -> Option<SolarPosition> {
        table.lookup(self.orientation?.heading())
    }

    /// Remove and return pending diagnostics, oldest first
    pub fn drain_diagnostics(&mut self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.diagnostics.drain()
    }

    /// Pending diagnostics
    pub fn diagnostics(&self) -> &DiagnosticLog<DIAGNOSTIC_LOG_CAPACITY> {
        &self.diagnostics
    }

    /// Latest published orientation
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Non-finite outputs in a row
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Estimator rebuilds triggered by failures or [`reset`](Self::reset)
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    /// Calibration snapshot
    pub fn calibration(&self) -> CalibrationState {
        self.calibration.state()
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Underlying estimator
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Heading reference, e.g. to feed it data
    pub fn reference_mut(&mut self) -> &mut R {
        &mut self.reference
    }

    /// Clock, e.g. to advance a fixed time source
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
