//! Solar Ephemeris Constants
//!
//! Low-precision solar position model (about 0.01° over 1950-2050) and
//! the geometry of the heading lookup table.
//!
//! Source: Astronomical Almanac low-precision formulae, J2000 epoch

/// Number of integer heading buckets in a solar table.
pub const HEADING_BUCKETS: usize = 360;

/// Minutes sampled when building a table (one full day).
pub const MINUTES_PER_TABLE: u32 = 24 * 60;

/// Julian date of the Unix epoch.
pub const JULIAN_DATE_UNIX_EPOCH: f64 = 2_440_588.0;

/// Julian date of the J2000.0 epoch.
pub const JULIAN_DATE_J2000: f64 = 2_451_545.0;

/// Obliquity of the ecliptic at J2000 (degrees).
pub const OBLIQUITY_DEG: f64 = 23.4397;

/// Solar mean anomaly at J2000 (degrees).
pub const MEAN_ANOMALY_EPOCH_DEG: f64 = 357.5291;

/// Daily motion of the solar mean anomaly (degrees/day).
pub const MEAN_ANOMALY_RATE_DEG: f64 = 0.985_600_28;

/// Perihelion of the Earth (degrees).
pub const PERIHELION_DEG: f64 = 102.9372;

/// Sidereal time at J2000 for longitude 0 (degrees).
pub const SIDEREAL_EPOCH_DEG: f64 = 280.16;

/// Daily advance of sidereal time (degrees/day).
pub const SIDEREAL_RATE_DEG: f64 = 360.985_623_5;

/// Elevation (degrees) below which no refraction correction is applied.
pub const REFRACTION_CUTOFF_DEG: f64 = -1.0;
