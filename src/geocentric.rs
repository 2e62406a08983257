//! Geodetic (WGS-84) to geocentric spherical coordinates.

use crate::constants::{MAX_DEG, TABLE_SIZE, WGS84_A_KM, WGS84_B_KM};

/// The latitude-and-altitude dependent part of a query position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SphericalCoordinates {
    /// Geocentric radius, in km.
    pub(crate) radius_km: f64,

    /// Cosine of the geocentric colatitude.
    pub(crate) cos_colat: f64,

    /// Sine of the geocentric colatitude.
    pub(crate) sin_colat: f64,

    /// Cosine of the geodetic minus geocentric latitude. Together with
    /// `sin_rot` this rotates spherical field components into geodetic ones.
    pub(crate) cos_rot: f64,

    pub(crate) sin_rot: f64,
}

impl SphericalCoordinates {
    /// Closed form; no iteration needed in this direction.
    pub(crate) fn from_geodetic(latitude_deg: f64, altitude_km: f64) -> Self {
        let (srlat, crlat) = latitude_deg.to_radians().sin_cos();
        let srlat2 = srlat * srlat;
        let crlat2 = crlat * crlat;

        let a2 = WGS84_A_KM * WGS84_A_KM;
        let b2 = WGS84_B_KM * WGS84_B_KM;
        let c2 = a2 - b2;
        let a4 = a2 * a2;
        let b4 = b2 * b2;
        let c4 = a4 - b4;

        let q = (a2 - c2 * srlat2).sqrt();
        let q1 = altitude_km * q;
        let q2 = ((q1 + a2) / (q1 + b2)).powi(2);
        let cos_colat = srlat / (q2 * crlat2 + srlat2).sqrt();
        let sin_colat = (1.0 - cos_colat * cos_colat).sqrt();
        let radius_km =
            (altitude_km * altitude_km + 2.0 * q1 + (a4 - c4 * srlat2) / (q * q)).sqrt();
        let d = (a2 * crlat2 + b2 * srlat2).sqrt();

        Self {
            radius_km,
            cos_colat,
            sin_colat,
            cos_rot: (altitude_km + d) / radius_km,
            sin_rot: c2 * crlat * srlat / (radius_km * d),
        }
    }
}

/// `sin(m * lon)` and `cos(m * lon)` for every order `m`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Azimuthal {
    pub(crate) sin: [f64; TABLE_SIZE],
    pub(crate) cos: [f64; TABLE_SIZE],
}

impl Azimuthal {
    pub(crate) fn new(longitude_deg: f64) -> Self {
        let mut sin = [0.0; TABLE_SIZE];
        let mut cos = [0.0; TABLE_SIZE];
        cos[0] = 1.0;
        (sin[1], cos[1]) = longitude_deg.to_radians().sin_cos();
        for m in 2..=MAX_DEG {
            sin[m] = sin[1] * cos[m - 1] + cos[1] * sin[m - 1];
            cos[m] = cos[1] * cos[m - 1] - sin[1] * sin[m - 1];
        }
        Self { sin, cos }
    }
}
