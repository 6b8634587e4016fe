//! Orientation value types
//!
//! [`EulerAngles`] is the raw, per-step output of the attitude filter and
//! may hold anything, NaN included. [`Orientation`] is the pipeline's
//! externally visible state and always satisfies its range invariants.

use crate::angle::{clamp_pitch, normalize_heading};
use crate::sensors::Validatable;

/// Heading, pitch and roll from one filter step
///
/// Units depend on the producer: the attitude estimator emits radians,
/// [`EulerAngles::to_degrees`] converts for the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EulerAngles {
    /// Rotation about the vertical axis
    pub heading: f32,
    /// Tilt of the forward axis above the horizon
    pub pitch: f32,
    /// Rotation about the forward axis
    pub roll: f32,
}

impl EulerAngles {
    /// Create from three angles
    pub const fn new(heading: f32, pitch: f32, roll: f32) -> Self {
        Self { heading, pitch, roll }
    }

    /// Convert radians to degrees, component-wise
    pub fn to_degrees(self) -> Self {
        Self {
            heading: self.heading.to_degrees(),
            pitch: self.pitch.to_degrees(),
            roll: self.roll.to_degrees(),
        }
    }
}

impl Validatable for EulerAngles {
    fn is_valid(&self) -> bool {
        self.heading.is_valid() && self.pitch.is_valid() && self.roll.is_valid()
    }
}

/// The pipeline's current orientation estimate, in degrees
///
/// ## Invariants
///
/// - `heading` is in [0, 360)
/// - `pitch` is in [-90, 90]
/// - `roll` is unbounded; it is smoothed but never wrapped
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Orientation {
    heading: f32,
    pitch: f32,
    roll: f32,
}

impl Orientation {
    /// Build an orientation, normalizing heading and clamping pitch
    pub fn new(heading: f32, pitch: f32, roll: f32) -> Self {
        Self {
            heading: normalize_heading(heading),
            pitch: clamp_pitch(pitch),
            roll,
        }
    }

    /// Build from degree-valued Euler angles
    pub fn from_euler_degrees(angles: EulerAngles) -> Self {
        Self::new(angles.heading, angles.pitch, angles.roll)
    }

    /// Compass heading in [0, 360)
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Pitch in [-90, 90]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Roll in degrees
    pub fn roll(&self) -> f32 {
        self.roll
    }
}
