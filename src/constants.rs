//! Model constants and the bundled coefficient table.

/// Highest degree (and order) of the spherical harmonic expansion.
pub const MAX_DEG: usize = 12;

/// Side length of the square `[m][n]` tables.
pub(crate) const TABLE_SIZE: usize = MAX_DEG + 1;

/// Mean radius of the IAU-66 ellipsoid, in km. The Gauss coefficients are
/// defined on a sphere of this radius.
pub const IAU66_RADIUS_KM: f64 = 6371.2;

/// Semi-major axis of the WGS-84 ellipsoid, in km.
pub const WGS84_A_KM: f64 = 6378.137;

/// Semi-minor axis of the WGS-84 ellipsoid, in km.
pub const WGS84_B_KM: f64 = 6356.7523142;

/// Number of years a WMM release is valid for, starting at its epoch.
pub const MODEL_VALIDITY_YEARS: f64 = 5.0;

/// The WMM-2015 coefficients in NOAA's `WMM.COF` layout.
pub const WMM2015_COF: &str = include_str!("WMM2015.COF");
