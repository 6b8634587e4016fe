//! Attitude Estimation from MARG Sensor Triples
//!
//! ## Overview
//!
//! The estimator fuses three sensors into one orientation quaternion:
//!
//! ```text
//! Gyroscope ─────→ integrate (fast, drifts)
//!                        │
//! Accelerometer ──┐      ▼
//!                 ├─→ gradient-descent correction ─→ q ─→ Euler angles
//! Magnetometer ───┘   (slow, absolute)
//! ```
//!
//! ### Gradient-Descent Correction
//!
//! Each step integrates the gyro rate and then pulls the estimate along the
//! normalized gradient of an objective function measuring how far the
//! predicted gravity and magnetic field directions are from the measured
//! ones:
//!
//! ```text
//! q̇ = ½·q ⊗ ω  −  β·∇f / ‖∇f‖
//! q  = normalize(q + q̇·Δt)
//! ```
//!
//! The gain β bounds the correction rate in rad/s. Higher β converges
//! faster but lets accelerometer jolts through; lower β is smoother and
//! slower to cancel drift.
//!
//! ## Degenerate Input
//!
//! A zero-length accelerometer or magnetometer vector has no direction.
//! Normalizing it yields NaN, the NaN reaches the quaternion and stays
//! there until the state is reinitialized. The estimator does not guard
//! against this: detecting non-finite output and resetting is the
//! pipeline's job.
//!
//! ## Memory Model
//!
//! ```text
//! MadgwickFilter size:
//! ├── Quaternion:      16 bytes
//! ├── Gain + interval:  8 bytes
//! └── Generation:       4 bytes
//! ```

use crate::orientation::EulerAngles;
use crate::sensors::SensorReading;

/// Unit quaternion `w + xi + yj + zk`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    /// Scalar part
    pub w: f32,
    /// i component
    pub x: f32,
    /// j component
    pub y: f32,
    /// k component
    pub z: f32,
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Quaternion = Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    /// Create from components
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Euclidean norm
    pub fn norm(&self) -> f32 {
        libm::sqrtf(self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// Scale to unit length (NaN in, NaN out)
    pub fn normalized(&self) -> Self {
        let recip = 1.0 / self.norm();
        Self {
            w: self.w * recip,
            x: self.x * recip,
            y: self.y * recip,
            z: self.z * recip,
        }
    }

    /// Heading/pitch/roll in radians (aerospace sequence)
    ///
    /// The sensor frame is x forward, y left, z up, so yaw about z is
    /// counter-clockwise seen from above. Heading is that yaw negated: a
    /// compass bearing that grows as the device turns clockwise.
    ///
    /// The asin argument is clamped to [-1, 1] to absorb rounding near
    /// ±90° pitch; NaN passes through the clamp untouched.
    pub fn to_euler(&self) -> EulerAngles {
        let Quaternion { w, x, y, z } = *self;

        let yaw = libm::atan2f(x * y + w * z, 0.5 - y * y - z * z);
        let heading = -yaw;
        let pitch = libm::asinf((-2.0 * (x * z - w * y)).clamp(-1.0, 1.0));
        let roll = libm::atan2f(w * x + y * z, 0.5 - x * x - y * y);

        EulerAngles::new(heading, pitch, roll)
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Sensor-fusion filter producing an orientation estimate
///
/// ## Contract
///
/// - `update` consumes one triple and advances the state by one fixed
///   sample interval. It is the only operation that mutates state.
/// - `euler_angles` is a pure read of the current estimate, in radians.
/// - `reinitialize` atomically replaces all state; gain and interval are
///   only ever changed this way.
pub trait AttitudeEstimator {
    /// Advance the filter by one sample interval
    fn update(&mut self, gyroscope: &SensorReading, accelerometer: &SensorReading, magnetometer: &SensorReading);

    /// Current estimate as heading/pitch/roll in radians, heading clockwise from north
    fn euler_angles(&self) -> EulerAngles;

    /// Current estimate as a quaternion
    fn quaternion(&self) -> Quaternion;

    /// Discard all state and start over with new parameters
    fn reinitialize(&mut self, gain: f32, sample_interval_s: f32);

    /// Gain (beta) in use
    fn gain(&self) -> f32;

    /// Number of reinitializations since construction
    fn generation(&self) -> u32;
}

/// Gradient-descent MARG orientation filter
#[derive(Debug, Clone)]
pub struct MadgwickFilter {
    q: Quaternion,
    beta: f32,
    sample_interval_s: f32,
    generation: u32,
}

impl MadgwickFilter {
    /// Create a filter at identity orientation
    pub fn new(gain: f32, sample_interval_s: f32) -> Self {
        Self {
            q: Quaternion::IDENTITY,
            beta: gain,
            sample_interval_s,
            generation: 0,
        }
    }

    /// Fixed sample interval in seconds
    pub fn sample_interval_s(&self) -> f32 {
        self.sample_interval_s
    }
}

impl Default for MadgwickFilter {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_GAIN,
            crate::constants::DEFAULT_SAMPLE_INTERVAL_S,
        )
    }
}

impl AttitudeEstimator for MadgwickFilter {
    fn update(&mut self, gyroscope: &SensorReading, accelerometer: &SensorReading, magnetometer: &SensorReading) {
        let Quaternion { w: q0, x: q1, y: q2, z: q3 } = self.q;
        let (gx, gy, gz) = (gyroscope.x, gyroscope.y, gyroscope.z);

        // Rate of change of quaternion from gyroscope
        let mut q_dot0 = 0.5 * (-q1 * gx - q2 * gy - q3 * gz);
        let mut q_dot1 = 0.5 * (q0 * gx + q2 * gz - q3 * gy);
        let mut q_dot2 = 0.5 * (q0 * gy - q1 * gz + q3 * gx);
        let mut q_dot3 = 0.5 * (q0 * gz + q1 * gy - q2 * gx);

        // Zero-length vectors turn into NaN here
        let recip = 1.0 / accelerometer.magnitude();
        let (ax, ay, az) = (accelerometer.x * recip, accelerometer.y * recip, accelerometer.z * recip);
        let recip = 1.0 / magnetometer.magnitude();
        let (mx, my, mz) = (magnetometer.x * recip, magnetometer.y * recip, magnetometer.z * recip);

        let two_q0mx = 2.0 * q0 * mx;
        let two_q0my = 2.0 * q0 * my;
        let two_q0mz = 2.0 * q0 * mz;
        let two_q1mx = 2.0 * q1 * mx;
        let two_q0 = 2.0 * q0;
        let two_q1 = 2.0 * q1;
        let two_q2 = 2.0 * q2;
        let two_q3 = 2.0 * q3;
        let two_q0q2 = 2.0 * q0 * q2;
        let two_q2q3 = 2.0 * q2 * q3;
        let q0q0 = q0 * q0;
        let q0q1 = q0 * q1;
        let q0q2 = q0 * q2;
        let q0q3 = q0 * q3;
        let q1q1 = q1 * q1;
        let q1q2 = q1 * q2;
        let q1q3 = q1 * q3;
        let q2q2 = q2 * q2;
        let q2q3 = q2 * q3;
        let q3q3 = q3 * q3;

        // Earth's magnetic field direction in the earth frame
        let hx = mx * q0q0 - two_q0my * q3 + two_q0mz * q2 + mx * q1q1 + two_q1 * my * q2
            + two_q1 * mz * q3 - mx * q2q2 - mx * q3q3;
        let hy = two_q0mx * q3 + my * q0q0 - two_q0mz * q1 + two_q1mx * q2 - my * q1q1
            + my * q2q2 + two_q2 * mz * q3 - my * q3q3;
        let two_bx = libm::sqrtf(hx * hx + hy * hy);
        let two_bz = -two_q0mx * q2 + two_q0my * q1 + mz * q0q0 + two_q1mx * q3 - mz * q1q1
            + two_q2 * my * q3 - mz * q2q2 + mz * q3q3;
        let four_bx = 2.0 * two_bx;
        let four_bz = 2.0 * two_bz;

        // Objective function residuals
        let f_g1 = 2.0 * q1q3 - two_q0q2 - ax;
        let f_g2 = 2.0 * q0q1 + two_q2q3 - ay;
        let f_g3 = 1.0 - 2.0 * q1q1 - 2.0 * q2q2 - az;
        let f_b1 = two_bx * (0.5 - q2q2 - q3q3) + two_bz * (q1q3 - q0q2) - mx;
        let f_b2 = two_bx * (q1q2 - q0q3) + two_bz * (q0q1 + q2q3) - my;
        let f_b3 = two_bx * (q0q2 + q1q3) + two_bz * (0.5 - q1q1 - q2q2) - mz;

        // Gradient: Jacobianᵀ · f
        let mut s0 = -two_q2 * f_g1 + two_q1 * f_g2 - two_bz * q2 * f_b1
            + (-two_bx * q3 + two_bz * q1) * f_b2
            + two_bx * q2 * f_b3;
        let mut s1 = two_q3 * f_g1 + two_q0 * f_g2 - 4.0 * q1 * f_g3
            + two_bz * q3 * f_b1
            + (two_bx * q2 + two_bz * q0) * f_b2
            + (two_bx * q3 - four_bz * q1) * f_b3;
        let mut s2 = -two_q0 * f_g1 + two_q3 * f_g2 - 4.0 * q2 * f_g3
            + (-four_bx * q2 - two_bz * q0) * f_b1
            + (two_bx * q1 + two_bz * q3) * f_b2
            + (two_bx * q0 - four_bz * q2) * f_b3;
        let mut s3 = two_q1 * f_g1 + two_q2 * f_g2
            + (-four_bx * q3 + two_bz * q1) * f_b1
            + (-two_bx * q0 + two_bz * q2) * f_b2
            + two_bx * q1 * f_b3;

        // A perfect match has a zero gradient: nothing to correct.
        // NaN compares unequal and flows through.
        let s_norm_sq = s0 * s0 + s1 * s1 + s2 * s2 + s3 * s3;
        if s_norm_sq != 0.0 {
            let recip = 1.0 / libm::sqrtf(s_norm_sq);
            s0 *= recip;
            s1 *= recip;
            s2 *= recip;
            s3 *= recip;
        }

        q_dot0 -= self.beta * s0;
        q_dot1 -= self.beta * s1;
        q_dot2 -= self.beta * s2;
        q_dot3 -= self.beta * s3;

        let dt = self.sample_interval_s;
        self.q = Quaternion::new(
            q0 + q_dot0 * dt,
            q1 + q_dot1 * dt,
            q2 + q_dot2 * dt,
            q3 + q_dot3 * dt,
        )
        .normalized();
    }

    fn euler_angles(&self) -> EulerAngles {
        self.q.to_euler()
    }

    fn quaternion(&self) -> Quaternion {
        self.q
    }

    fn reinitialize(&mut self, gain: f32, sample_interval_s: f32) {
        *self = Self {
            q: Quaternion::IDENTITY,
            beta: gain,
            sample_interval_s,
            generation: self.generation.wrapping_add(1),
        };
    }

    fn gain(&self) -> f32 {
        self.beta
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}
