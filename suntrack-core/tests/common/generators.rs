//! Sensor vector generators
//!
//! Device frame: x forward, y left, z up. Gravity reads +1 g on z when
//! flat; the field has a 20 µT horizontal and 40 µT downward component.

use suntrack_core::{
    calibration::HeadingReference, AttitudeEstimator, OrientationPipeline, SensorReading,
    StepOutcome, TimeSource,
};

/// Not rotating
pub const STILL: SensorReading = SensorReading::new(0.0, 0.0, 0.0);

/// Lying flat
pub const FLAT: SensorReading = SensorReading::new(0.0, 0.0, 1.0);

/// Zero-length gravity vector, poisons the filter
pub const DEAD_ACCELEROMETER: SensorReading = SensorReading::new(0.0, 0.0, 0.0);

/// Magnetometer reading for a flat device facing compass `bearing_deg`
pub fn field_facing(bearing_deg: f32) -> SensorReading {
    let bearing = bearing_deg.to_radians();
    SensorReading::new(20.0 * bearing.cos(), 20.0 * bearing.sin(), -40.0)
}

/// Deliver one reading from each sensor, returning the last outcome
pub fn feed<R, C, E>(
    pipeline: &mut OrientationPipeline<R, C, E>,
    gyroscope: SensorReading,
    accelerometer: SensorReading,
    magnetometer: SensorReading,
) -> StepOutcome
where
    R: HeadingReference,
    C: TimeSource,
    E: AttitudeEstimator,
{
    pipeline.on_gyroscope(gyroscope);
    pipeline.on_accelerometer(accelerometer);
    pipeline.on_magnetometer(magnetometer)
}

/// Deliver `rounds` flat, still, north-facing triples
pub fn feed_level_north<R, C, E>(pipeline: &mut OrientationPipeline<R, C, E>, rounds: usize) -> StepOutcome
where
    R: HeadingReference,
    C: TimeSource,
    E: AttitudeEstimator,
{
    let mut last = StepOutcome::WaitingForSensors;
    for _ in 0..rounds {
        last = feed(pipeline, STILL, FLAT, field_facing(0.0));
    }
    last
}
