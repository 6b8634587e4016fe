//! Shared fixtures for pipeline integration tests
//!
//! - `ScriptedReference`: heading reference answering from a queue
//! - `FixedAttitude`: estimator whose output the test steers directly
//! - `generators`: physically plausible sensor vectors

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use suntrack_core::{
    calibration::{HeadingReference, ReferenceError},
    AttitudeEstimator, EulerAngles, Quaternion, SensorReading,
};

pub mod generators;

/// Heading reference replaying scripted answers, then `Unavailable`
#[derive(Debug, Default)]
pub struct ScriptedReference {
    answers: VecDeque<nb::Result<f32, ReferenceError>>,
    requests: u32,
}

impl ScriptedReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completed answer
    pub fn answer(&mut self, heading: f32) -> &mut Self {
        self.answers.push_back(Ok(heading));
        self
    }

    /// Queue one `WouldBlock`
    pub fn stall(&mut self) -> &mut Self {
        self.answers.push_back(Err(nb::Error::WouldBlock));
        self
    }

    /// Queue an explicit `Unavailable`
    pub fn unavailable(&mut self) -> &mut Self {
        self.answers
            .push_back(Err(nb::Error::Other(ReferenceError::Unavailable)));
        self
    }

    /// Number of `request` calls seen
    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl HeadingReference for ScriptedReference {
    fn request(&mut self) {
        self.requests += 1;
    }

    fn poll(&mut self) -> nb::Result<f32, ReferenceError> {
        self.answers
            .pop_front()
            .unwrap_or(Err(nb::Error::Other(ReferenceError::Unavailable)))
    }
}

/// Estimator reporting whatever angles (degrees) the test sets
#[derive(Debug, Clone)]
pub struct FixedAttitude {
    angles: Rc<Cell<EulerAngles>>,
    gain: f32,
    generation: u32,
    updates: u32,
}

impl FixedAttitude {
    /// Estimator plus a handle for steering its output
    pub fn new(heading: f32, pitch: f32, roll: f32) -> (Self, Rc<Cell<EulerAngles>>) {
        let angles = Rc::new(Cell::new(EulerAngles::new(heading, pitch, roll)));
        let estimator = Self {
            angles: Rc::clone(&angles),
            gain: 0.1,
            generation: 0,
            updates: 0,
        };
        (estimator, angles)
    }

    pub fn updates(&self) -> u32 {
        self.updates
    }
}

impl AttitudeEstimator for FixedAttitude {
    fn update(&mut self, _: &SensorReading, _: &SensorReading, _: &SensorReading) {
        self.updates += 1;
    }

    fn euler_angles(&self) -> EulerAngles {
        let deg = self.angles.get();
        EulerAngles::new(
            deg.heading.to_radians(),
            deg.pitch.to_radians(),
            deg.roll.to_radians(),
        )
    }

    fn quaternion(&self) -> Quaternion {
        Quaternion::IDENTITY
    }

    fn reinitialize(&mut self, gain: f32, _sample_interval_s: f32) {
        self.gain = gain;
        self.generation += 1;
    }

    fn gain(&self) -> f32 {
        self.gain
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}

/// Absolute difference within tolerance
pub fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}
