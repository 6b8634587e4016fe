//! Sensor readings and input validation
//!
//! The three motion sensors arrive on independent callbacks with no phase
//! alignment. The pipeline keeps only the most recent vector per sensor
//! ([`LatestReadings`]) and checks every vector for non-finite components
//! before it is allowed near the filter.
//!
//! Units follow the platform sensor APIs:
//! - Gyroscope: rad/s
//! - Accelerometer: g (any consistent unit works, the filter normalizes)
//! - Magnetometer: µT (likewise normalized)

use crate::errors::{TrackingError, TrackingResult};

/// Which motion sensor a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SensorKind {
    /// Angular rate sensor
    Gyroscope = 0,
    /// Linear acceleration (gravity) sensor
    Accelerometer = 1,
    /// Magnetic field sensor
    Magnetometer = 2,
}

impl SensorKind {
    /// All sensor kinds in filter argument order
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Gyroscope,
        SensorKind::Accelerometer,
        SensorKind::Magnetometer,
    ];

    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Magnetometer => "magnetometer",
        }
    }

    /// Get expected unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            SensorKind::Gyroscope => "rad/s",
            SensorKind::Accelerometer => "g",
            SensorKind::Magnetometer => "µT",
        }
    }
}

/// One three-axis sample from a motion sensor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// X axis
    pub x: f32,
    /// Y axis
    pub y: f32,
    /// Z axis
    pub z: f32,
}

impl SensorReading {
    /// Create a reading from its three components
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length of the vector
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is numerically usable (not NaN, infinite, etc)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for SensorReading {
    fn is_valid(&self) -> bool {
        self.x.is_valid() && self.y.is_valid() && self.z.is_valid()
    }
}

/// True when a reading is present and every component is finite
pub fn is_valid_sensor_reading(reading: Option<&SensorReading>) -> bool {
    reading.map_or(false, Validatable::is_valid)
}

/// True when all three sensors have delivered at least one reading
pub fn has_all_sensor_readings(
    gyroscope: Option<&SensorReading>,
    accelerometer: Option<&SensorReading>,
    magnetometer: Option<&SensorReading>,
) -> bool {
    gyroscope.is_some() && accelerometer.is_some() && magnetometer.is_some()
}

/// Reject a reading with any non-finite component
pub fn validate_reading(sensor: SensorKind, reading: &SensorReading) -> TrackingResult<()> {
    if reading.is_valid() {
        Ok(())
    } else {
        Err(TrackingError::InvalidReading { sensor })
    }
}

/// A complete gyroscope/accelerometer/magnetometer triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorTriple {
    /// Angular rate
    pub gyroscope: SensorReading,
    /// Gravity direction
    pub accelerometer: SensorReading,
    /// Magnetic field direction
    pub magnetometer: SensorReading,
}

impl SensorTriple {
    /// Validate all three readings, reporting the first bad sensor
    pub fn validate(&self) -> TrackingResult<()> {
        validate_reading(SensorKind::Gyroscope, &self.gyroscope)?;
        validate_reading(SensorKind::Accelerometer, &self.accelerometer)?;
        validate_reading(SensorKind::Magnetometer, &self.magnetometer)
    }
}

/// Most recent reading per sensor
///
/// Each slot is overwritten on arrival and read at update time; nothing
/// older than the latest sample is retained.
#[derive(Debug, Clone, Default)]
pub struct LatestReadings {
    gyroscope: Option<SensorReading>,
    accelerometer: Option<SensorReading>,
    magnetometer: Option<SensorReading>,
}

impl LatestReadings {
    /// Empty buffer, no sensor seen yet
    pub const fn new() -> Self {
        Self {
            gyroscope: None,
            accelerometer: None,
            magnetometer: None,
        }
    }

    /// Overwrite the slot for `sensor`
    pub fn store(&mut self, sensor: SensorKind, reading: SensorReading) {
        let slot = match sensor {
            SensorKind::Gyroscope => &mut self.gyroscope,
            SensorKind::Accelerometer => &mut self.accelerometer,
            SensorKind::Magnetometer => &mut self.magnetometer,
        };
        *slot = Some(reading);
    }

    /// Latest reading for one sensor
    pub fn get(&self, sensor: SensorKind) -> Option<&SensorReading> {
        match sensor {
            SensorKind::Gyroscope => self.gyroscope.as_ref(),
            SensorKind::Accelerometer => self.accelerometer.as_ref(),
            SensorKind::Magnetometer => self.magnetometer.as_ref(),
        }
    }

    /// Whether every sensor has reported at least once
    pub fn is_complete(&self) -> bool {
        has_all_sensor_readings(
            self.gyroscope.as_ref(),
            self.accelerometer.as_ref(),
            self.magnetometer.as_ref(),
        )
    }

    /// The full triple, once all three sensors have reported
    pub fn triple(&self) -> Option<SensorTriple> {
        Some(SensorTriple {
            gyroscope: self.gyroscope?,
            accelerometer: self.accelerometer?,
            magnetometer: self.magnetometer?,
        })
    }

    /// Forget every reading
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: SensorReading = SensorReading::new(0.1, -0.2, 0.98);

    #[test]
    fn all_readings_requires_three() {
        assert!(has_all_sensor_readings(Some(&GOOD), Some(&GOOD), Some(&GOOD)));
        assert!(!has_all_sensor_readings(None, Some(&GOOD), Some(&GOOD)));
        assert!(!has_all_sensor_readings(Some(&GOOD), None, Some(&GOOD)));
        assert!(!has_all_sensor_readings(Some(&GOOD), Some(&GOOD), None));
        assert!(!has_all_sensor_readings(None, None, None));
    }

    #[test]
    fn reading_validity() {
        assert!(is_valid_sensor_reading(Some(&GOOD)));
        assert!(!is_valid_sensor_reading(None));
        assert!(!is_valid_sensor_reading(Some(&SensorReading::new(f32::NAN, 0.0, 0.0))));
        assert!(!is_valid_sensor_reading(Some(&SensorReading::new(0.0, f32::INFINITY, 0.0))));
        assert!(!is_valid_sensor_reading(Some(&SensorReading::new(0.0, 0.0, f32::NEG_INFINITY))));
        // Zero vectors are finite; the filter, not validation, chokes on them
        assert!(is_valid_sensor_reading(Some(&SensorReading::default())));
    }

    #[test]
    fn validate_names_the_sensor() {
        let bad = SensorReading::new(f32::NAN, 0.0, 0.0);
        assert_eq!(
            validate_reading(SensorKind::Magnetometer, &bad),
            Err(TrackingError::InvalidReading { sensor: SensorKind::Magnetometer })
        );

        let triple = SensorTriple {
            gyroscope: GOOD,
            accelerometer: bad,
            magnetometer: bad,
        };
        assert_eq!(
            triple.validate(),
            Err(TrackingError::InvalidReading { sensor: SensorKind::Accelerometer })
        );
    }

    #[test]
    fn latest_readings_overwrite() {
        let mut latest = LatestReadings::new();
        assert!(latest.triple().is_none());

        latest.store(SensorKind::Gyroscope, GOOD);
        latest.store(SensorKind::Accelerometer, GOOD);
        assert!(!latest.is_complete());

        latest.store(SensorKind::Magnetometer, GOOD);
        let newer = SensorReading::new(1.0, 2.0, 3.0);
        latest.store(SensorKind::Gyroscope, newer);

        let triple = latest.triple().unwrap();
        assert_eq!(triple.gyroscope, newer);
        assert_eq!(latest.get(SensorKind::Magnetometer), Some(&GOOD));

        latest.clear();
        assert!(!latest.is_complete());
    }

    #[test]
    fn magnitude() {
        assert!((SensorReading::new(3.0, 4.0, 0.0).magnitude() - 5.0).abs() < 1e-6);
    }
}
