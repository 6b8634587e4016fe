//! Solar position and the heading → sun lookup table
//!
//! ## Overview
//!
//! The display needs to answer "when is the sun over there, and how high?"
//! for whatever bearing the device points at. Computing an ephemeris per
//! frame is wasteful, so a table is built once per location fix:
//!
//! ```text
//! for each minute of the next 24 h:
//!     (azimuth, elevation) = sun_position(t, lat, lon)
//!     table[floor(azimuth)] = { t, round(elevation) }   // last write wins
//! ```
//!
//! Buckets the sun never crosses stay empty. Near the equator around an
//! equinox the sun rises due east and sets due west, so most of the table
//! is empty; lookups against empty buckets return `None`.
//!
//! ## Ephemeris
//!
//! Low-precision model in days since J2000: mean anomaly, equation of
//! centre, ecliptic longitude, then declination and right ascension, local
//! sidereal time and hour angle. Azimuth is reported clockwise from north.
//! Accuracy is a fraction of a degree, well under one table bucket.

use crate::angle::normalize_heading;
use crate::constants::solar::{
    JULIAN_DATE_J2000, JULIAN_DATE_UNIX_EPOCH, MEAN_ANOMALY_EPOCH_DEG, MEAN_ANOMALY_RATE_DEG,
    OBLIQUITY_DEG, PERIHELION_DEG, REFRACTION_CUTOFF_DEG, SIDEREAL_EPOCH_DEG, SIDEREAL_RATE_DEG,
};
use crate::constants::{HEADING_BUCKETS, MINUTES_PER_TABLE, MS_PER_DAY, MS_PER_MINUTE};
use crate::errors::{TrackingError, TrackingResult};
use crate::time::Timestamp;

const FULL_CIRCLE: f64 = 360.0;

/// Sun direction at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SunPosition {
    /// Clockwise from north, [0, 360)
    pub azimuth_degrees: f64,
    /// Above the horizon, refraction corrected
    pub elevation_degrees: f64,
}

/// One table bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolarTableEntry {
    /// When the sun stood at this bearing
    pub time: Timestamp,
    /// Rounded elevation at that time
    pub elevation_degrees: i32,
}

/// Result of a heading lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolarPosition {
    /// Integer bearing bucket the heading fell into
    pub heading_bucket: u16,
    /// When the sun stands at that bearing
    pub time: Timestamp,
    /// Rounded sun elevation
    pub elevation_degrees: i32,
}

/// Sun position for a Unix time in milliseconds and a location in degrees
pub fn sun_position(timestamp: Timestamp, latitude: f64, longitude: f64) -> SunPosition {
    let days = days_since_j2000(timestamp);

    let mean_anomaly = (MEAN_ANOMALY_EPOCH_DEG + MEAN_ANOMALY_RATE_DEG * days).to_radians();
    let centre = (1.9148 * libm::sin(mean_anomaly)
        + 0.02 * libm::sin(2.0 * mean_anomaly)
        + 0.0003 * libm::sin(3.0 * mean_anomaly))
    .to_radians();
    let ecliptic_longitude =
        mean_anomaly + centre + PERIHELION_DEG.to_radians() + core::f64::consts::PI;

    let obliquity = OBLIQUITY_DEG.to_radians();
    let declination = libm::asin(libm::sin(obliquity) * libm::sin(ecliptic_longitude));
    let right_ascension = libm::atan2(
        libm::sin(ecliptic_longitude) * libm::cos(obliquity),
        libm::cos(ecliptic_longitude),
    );

    let sidereal = (SIDEREAL_EPOCH_DEG + SIDEREAL_RATE_DEG * days + longitude).to_radians();
    let hour_angle = sidereal - right_ascension;
    let phi = latitude.to_radians();

    let altitude = libm::asin(
        libm::sin(phi) * libm::sin(declination)
            + libm::cos(phi) * libm::cos(declination) * libm::cos(hour_angle),
    );
    // Measured from south, positive westward
    let azimuth = libm::atan2(
        libm::sin(hour_angle),
        libm::cos(hour_angle) * libm::sin(phi) - libm::tan(declination) * libm::cos(phi),
    );

    let mut elevation_degrees = altitude.to_degrees();
    if elevation_degrees > REFRACTION_CUTOFF_DEG {
        elevation_degrees += refraction(altitude).to_degrees();
    }

    SunPosition {
        azimuth_degrees: normalize_degrees(azimuth.to_degrees() + 180.0),
        elevation_degrees,
    }
}

fn days_since_j2000(timestamp: Timestamp) -> f64 {
    let julian = timestamp as f64 / MS_PER_DAY as f64 - 0.5 + JULIAN_DATE_UNIX_EPOCH;
    julian - JULIAN_DATE_J2000
}

/// Atmospheric refraction in radians for a true altitude in radians
fn refraction(altitude: f64) -> f64 {
    let h = if altitude < 0.0 { 0.0 } else { altitude };
    0.000_296_7 / libm::tan(h + 0.003_125_36 / (h + 0.089_011_79))
}

fn normalize_degrees(angle: f64) -> f64 {
    let mut wrapped = libm::fmod(angle, FULL_CIRCLE);
    if wrapped < 0.0 {
        wrapped += FULL_CIRCLE;
    }
    if wrapped >= FULL_CIRCLE {
        wrapped = 0.0;
    }
    wrapped
}

/// Heading → sun time/elevation for one location and day
///
/// Immutable once generated; build a new one when the location changes.
///
/// The 360 entries live inline, so the table is about 5.7 KB. Keep it in a
/// `static` or another long-lived owner and hand out references; returning
/// it by value through deep call chains can exhaust a small embedded stack.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarTable {
    entries: [Option<SolarTableEntry>; HEADING_BUCKETS],
    latitude: f64,
    longitude: f64,
    start: Timestamp,
}

impl SolarTable {
    /// Sample one minute at a time for 24 hours from `start`
    pub fn generate(latitude: f64, longitude: f64, start: Timestamp) -> TrackingResult<Self> {
        let latitude_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let longitude_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !latitude_ok || !longitude_ok {
            return Err(TrackingError::LocationOutOfRange { latitude, longitude });
        }

        let mut entries = [None; HEADING_BUCKETS];
        for minute in 0..MINUTES_PER_TABLE {
            let time = start.saturating_add(u64::from(minute) * MS_PER_MINUTE);
            let sun = sun_position(time, latitude, longitude);
            let bucket = libm::floor(sun.azimuth_degrees) as usize % HEADING_BUCKETS;
            entries[bucket] = Some(SolarTableEntry {
                time,
                elevation_degrees: libm::round(sun.elevation_degrees) as i32,
            });
        }

        let table = Self {
            entries,
            latitude,
            longitude,
            start,
        };
        log_debug!(
            "Solar table for ({}, {}) covers {} of {} headings",
            latitude,
            longitude,
            table.covered_buckets(),
            HEADING_BUCKETS
        );
        Ok(table)
    }

    /// Sun time and elevation for the bucket containing `heading`
    pub fn lookup(&self, heading: f32) -> Option<SolarPosition> {
        if !heading.is_finite() {
            return None;
        }
        let bucket = libm::floorf(normalize_heading(heading)) as usize % HEADING_BUCKETS;
        let entry = self.entries[bucket]?;
        Some(SolarPosition {
            heading_bucket: bucket as u16,
            time: entry.time,
            elevation_degrees: entry.elevation_degrees,
        })
    }

    /// Entry for one integer bucket; out-of-range indices yield `None`
    pub fn entry(&self, bucket: usize) -> Option<&SolarTableEntry> {
        self.entries.get(bucket).and_then(Option::as_ref)
    }

    /// All buckets, indexed by integer heading
    pub fn entries(&self) -> &[Option<SolarTableEntry>; HEADING_BUCKETS] {
        &self.entries
    }

    /// Number of buckets holding data
    pub fn covered_buckets(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Latitude the table was built for
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude the table was built for
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// First sampled instant
    pub fn start(&self) -> Timestamp {
        self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-03-20T00:00:00Z
    const EQUINOX_MIDNIGHT: Timestamp = 1_710_892_800_000;
    /// 2024-03-20T12:00:00Z
    const EQUINOX_NOON: Timestamp = 1_710_936_000_000;
    /// 2024-06-20T00:00:00Z
    const SOLSTICE_MIDNIGHT: Timestamp = 1_718_841_600_000;
    /// 2024-06-20T12:00:00Z
    const SOLSTICE_NOON: Timestamp = 1_718_884_800_000;

    #[test]
    fn equator_equinox_noon_is_overhead() {
        let sun = sun_position(EQUINOX_NOON, 0.0, 0.0);
        assert!(sun.elevation_degrees > 85.0, "elevation {}", sun.elevation_degrees);

        let sun = sun_position(EQUINOX_MIDNIGHT, 0.0, 0.0);
        assert!(sun.elevation_degrees < -80.0, "elevation {}", sun.elevation_degrees);
    }

    #[test]
    fn london_solstice_noon() {
        let sun = sun_position(SOLSTICE_NOON, 51.5, -0.13);
        assert!((sun.elevation_degrees - 61.9).abs() < 1.0, "elevation {}", sun.elevation_degrees);
        // Sun is due south at local noon
        assert!((sun.azimuth_degrees - 180.0).abs() < 3.0, "azimuth {}", sun.azimuth_degrees);
    }

    #[test]
    fn morning_sun_is_in_the_east() {
        // 06:00 UTC at lon 0, lat 0: rising near due east
        let sun = sun_position(EQUINOX_MIDNIGHT + 6 * 3_600_000, 0.0, 0.0);
        assert!((sun.azimuth_degrees - 90.0).abs() < 5.0, "azimuth {}", sun.azimuth_degrees);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = SolarTable::generate(40.0, -3.7, SOLSTICE_MIDNIGHT).unwrap();
        let b = SolarTable::generate(40.0, -3.7, SOLSTICE_MIDNIGHT).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.start(), SOLSTICE_MIDNIGHT);
    }

    #[test]
    fn midnight_sun_covers_every_heading() {
        let table = SolarTable::generate(78.0, 15.0, SOLSTICE_MIDNIGHT).unwrap();
        assert_eq!(table.covered_buckets(), HEADING_BUCKETS);

        for heading in [0.0f32, 90.5, 180.0, 359.9] {
            let position = table.lookup(heading).unwrap();
            assert!(position.elevation_degrees > 0, "{:?}", position);
        }
    }

    #[test]
    fn equator_equinox_leaves_gaps() {
        let table = SolarTable::generate(0.0, 0.0, EQUINOX_MIDNIGHT).unwrap();
        assert!(table.covered_buckets() < 60, "covered {}", table.covered_buckets());

        let empty = table
            .entries()
            .iter()
            .position(Option::is_none)
            .unwrap();
        assert!(table.entry(empty).is_none());
        assert_eq!(table.lookup(empty as f32 + 0.5), None);
    }

    #[test]
    fn lookup_truncates_and_wraps() {
        let table = SolarTable::generate(78.0, 15.0, SOLSTICE_MIDNIGHT).unwrap();

        assert_eq!(table.lookup(45.9).unwrap().heading_bucket, 45);
        assert_eq!(table.lookup(405.2).unwrap().heading_bucket, 45);
        assert_eq!(table.lookup(-0.5).unwrap().heading_bucket, 359);
        assert_eq!(table.lookup(f32::NAN), None);
        assert_eq!(table.lookup(f32::INFINITY), None);
        assert_eq!(table.entry(HEADING_BUCKETS), None);
    }

    #[test]
    fn entries_fall_within_the_day() {
        let table = SolarTable::generate(51.5, -0.13, SOLSTICE_MIDNIGHT).unwrap();
        for entry in table.entries().iter().flatten() {
            assert!(entry.time >= SOLSTICE_MIDNIGHT);
            assert!(entry.time < SOLSTICE_MIDNIGHT + MS_PER_DAY);
            assert!((-90..=90).contains(&entry.elevation_degrees));
        }
    }

    #[test]
    fn rejects_bad_coordinates() {
        for (lat, lon) in [(91.0, 0.0), (-90.5, 0.0), (0.0, 180.5), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            assert!(matches!(
                SolarTable::generate(lat, lon, 0),
                Err(TrackingError::LocationOutOfRange { .. })
            ));
        }
        assert!(SolarTable::generate(90.0, -180.0, 0).is_ok());
    }

    #[test]
    fn table_is_stored_inline() {
        let size = core::mem::size_of::<SolarTable>();
        assert!((5_700..6_144).contains(&size), "size {}", size);
    }
}
