//! Angle arithmetic for cyclic headings and bounded pitch
//!
//! ## Overview
//!
//! Headings live on a circle, so the naive arithmetic that works for pitch
//! breaks at the 0°/360° seam: averaging 350° and 10° gives 180°, the
//! exact opposite of the intended answer. Everything here is a pure
//! function so it can be called from interrupt context and tested in
//! isolation.
//!
//! ## Smoothing Across the Seam
//!
//! ```text
//! prior = 350°, next = 10°, smoothing = 0.2
//!
//! raw difference  = 10 - 350 = -340°   (> 180° apart)
//! unwrapped next  = 10 + 360 = 370°
//! blended         = 350·0.2 + 370·0.8 = 366°
//! normalized      = 6°
//! ```
//!
//! [`smooth_value`] returns the un-normalized 366°; callers
//! that deal in headings normalize afterwards, which is what
//! [`smooth_orientation`] does.
//!
//! ## Known Limitation
//!
//! Smoothing is linear in the unwrapped angle. It does not bound the step
//! size when `next` itself is wrong: a run of bad inputs converges the
//! output onto the bad value.

use crate::orientation::Orientation;

/// Full circle in degrees
pub const FULL_CIRCLE_DEG: f32 = 360.0;

/// Half circle in degrees
pub const HALF_CIRCLE_DEG: f32 = 180.0;

/// Pitch limit in degrees (straight up / straight down)
pub const PITCH_LIMIT_DEG: f32 = 90.0;

/// Reduce a heading into [0, 360)
///
/// Negative inputs wrap forward, exactly 360 maps to 0 and the result is
/// never negative zero. NaN stays NaN.
pub fn normalize_heading(heading: f32) -> f32 {
    let mut wrapped = libm::fmodf(heading, FULL_CIRCLE_DEG);
    if wrapped < 0.0 {
        wrapped += FULL_CIRCLE_DEG;
    }
    // Tiny negatives round up to exactly 360 after the shift
    if wrapped >= FULL_CIRCLE_DEG {
        wrapped = 0.0;
    }
    // -0.0 + 0.0 == +0.0
    wrapped + 0.0
}

/// Reduce a signed angle into (-180, 180]
pub fn normalize_signed(angle: f32) -> f32 {
    let wrapped = normalize_heading(angle);
    if wrapped > HALF_CIRCLE_DEG {
        wrapped - FULL_CIRCLE_DEG
    } else {
        wrapped
    }
}

/// Shortest signed turn from heading `from` to heading `to`, in (-180, 180]
pub fn heading_difference(from: f32, to: f32) -> f32 {
    normalize_signed(to - from)
}

/// Clamp pitch into [-90, 90]; pitch is not cyclic
pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG)
}

/// Exponential smoothing that takes the short way around the circle
///
/// `smoothing` is the weight kept from `prior`: 0 returns `next`
/// unchanged, 1 returns `prior` unchanged. The result is not normalized.
pub fn smooth_value(prior: f32, next: f32, smoothing: f32) -> f32 {
    let delta = next - prior;
    let next = if delta > HALF_CIRCLE_DEG {
        next - FULL_CIRCLE_DEG
    } else if delta < -HALF_CIRCLE_DEG {
        next + FULL_CIRCLE_DEG
    } else {
        next
    };
    prior * smoothing + next * (1.0 - smoothing)
}

/// Smooth every component, then normalize heading and clamp pitch
///
/// Roll is smoothed but neither wrapped nor clamped.
pub fn smooth_orientation(prior: &Orientation, next: &Orientation, smoothing: f32) -> Orientation {
    Orientation::new(
        smooth_value(prior.heading(), next.heading(), smoothing),
        smooth_value(prior.pitch(), next.pitch(), smoothing),
        smooth_value(prior.roll(), next.roll(), smoothing),
    )
}

/// Add a correction offset to a heading and renormalize
pub fn apply_offset(heading: f32, offset: f32) -> f32 {
    normalize_heading(heading + offset)
}
