//! The World Magnetic Model (WMM).
//!
//! Computes the Earth's main magnetic field (declination, inclination, total,
//! horizontal and vertical intensity, and the north and east components) at a
//! geodetic position and date, from a degree and order 12 spherical harmonic
//! expansion with linear secular variation.
//!
//! A [`Geomagnetism`] evaluator keeps the intermediate tables of its previous
//! evaluation, so a query that only changes the date (or only the longitude)
//! skips the work that depends on the unchanged inputs. It is not meant to be
//! shared between threads; make one per thread instead.
//!
//! ```no_run
//! let mut wmm = geomagnetism::Geomagnetism::wmm2015()?;
//! let field = wmm.calculate_at_decimal_year(-105.0, 40.0, 1600.0, 2017.5)?;
//! println!("declination {:.2}°", field.declination);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod coefficients;
pub mod constants;
mod error;
mod geocentric;
mod legendre;
pub mod utils;

pub use coefficients::Coefficients;
pub use error::{CoefficientError, InputError};

use log::{trace, warn};
use time::{Date, OffsetDateTime};

use crate::{
    coefficients::{NormalizationFactors, Table},
    constants::{IAU66_RADIUS_KM, MAX_DEG, TABLE_SIZE},
    geocentric::{Azimuthal, SphericalCoordinates},
    legendre::LegendreTable,
};

/// The magnetic field at one place and time. Intensities are in nT, angles in
/// degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomagneticField {
    /// Angle from true north to magnetic north. East is positive.
    pub declination: f64,

    /// Angle of the field below the horizontal. Down is positive.
    pub inclination: f64,

    pub intensity: f64,
    pub horizontal_intensity: f64,
    pub north_intensity: f64,
    pub east_intensity: f64,

    /// Positive downward.
    pub vertical_intensity: f64,
}

impl GeomagneticField {
    const UNSET: Self = Self {
        declination: f64::NAN,
        inclination: f64::NAN,
        intensity: f64::NAN,
        horizontal_intensity: f64::NAN,
        north_intensity: f64::NAN,
        east_intensity: f64::NAN,
        vertical_intensity: f64::NAN,
    };

    fn from_components(north: f64, east: f64, down: f64) -> Self {
        let horizontal = north.hypot(east);
        Self {
            declination: east.atan2(north).to_degrees(),
            inclination: down.atan2(horizontal).to_degrees(),
            intensity: horizontal.hypot(down),
            horizontal_intensity: horizontal,
            north_intensity: north,
            east_intensity: east,
            vertical_intensity: down,
        }
    }
}

/// The inputs of the last successful evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
struct QueryState {
    longitude: f64,
    latitude: f64,
    altitude_km: f64,
    decimal_year: f64,
}

/// A stateful WMM evaluator.
#[derive(Clone, Debug)]
pub struct Geomagnetism {
    coefficients: Coefficients,
    factors: NormalizationFactors,

    /// Unnormalised main field coefficients, same layout as
    /// [`Coefficients`].
    gauss: Table,

    /// Unnormalised secular variation.
    gauss_secular: Table,

    last_query: Option<QueryState>,
    spherical: SphericalCoordinates,
    azimuthal: Azimuthal,
    legendre: LegendreTable,

    /// Coefficients adjusted to the date of the last query.
    time_adjusted: Table,

    field: GeomagneticField,
}

impl Geomagnetism {
    pub fn new(coefficients: &Coefficients) -> Self {
        let factors = NormalizationFactors::new();
        let (gauss, gauss_secular) = coefficients.unnormalise(&factors);
        Self {
            coefficients: coefficients.clone(),
            factors,
            gauss,
            gauss_secular,
            last_query: None,
            spherical: SphericalCoordinates::default(),
            azimuthal: Azimuthal::default(),
            legendre: LegendreTable::default(),
            time_adjusted: [[0.0; TABLE_SIZE]; TABLE_SIZE],
            field: GeomagneticField::UNSET,
        }
    }

    /// An evaluator for the bundled WMM-2015 coefficients.
    pub fn wmm2015() -> Result<Self, CoefficientError> {
        Ok(Self::new(&Coefficients::wmm2015()?))
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn epoch(&self) -> f64 {
        self.coefficients.epoch
    }

    /// Evaluate the field for a calendar date. Longitude and latitude are
    /// geodetic, in degrees; altitude is above the WGS-84 ellipsoid, in
    /// metres.
    pub fn calculate(
        &mut self,
        longitude: f64,
        latitude: f64,
        altitude: f64,
        date: Date,
    ) -> Result<GeomagneticField, InputError> {
        self.calculate_at_decimal_year(longitude, latitude, altitude, utils::decimal_year(date))
    }

    /// Evaluate the field on the ellipsoid surface for today's (UTC) date.
    pub fn calculate_now(
        &mut self,
        longitude: f64,
        latitude: f64,
    ) -> Result<GeomagneticField, InputError> {
        self.calculate(longitude, latitude, 0.0, OffsetDateTime::now_utc().date())
    }

    /// Evaluate the field for a decimal year, e.g. 2017.5. Only the stages
    /// whose inputs differ from the previous evaluation are recomputed.
    ///
    /// On error, nothing about the evaluator changes.
    pub fn calculate_at_decimal_year(
        &mut self,
        longitude: f64,
        latitude: f64,
        altitude: f64,
        decimal_year: f64,
    ) -> Result<GeomagneticField, InputError> {
        if !longitude.is_finite() {
            return Err(InputError::NonFiniteLongitude(longitude));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InputError::InvalidLatitude(latitude));
        }
        if !altitude.is_finite() {
            return Err(InputError::NonFiniteAltitude(altitude));
        }
        if !decimal_year.is_finite() {
            return Err(InputError::NonFiniteYear(decimal_year));
        }

        let altitude_km = altitude / 1000.0;
        let last = self.last_query;

        if last.map_or(true, |q| q.latitude != latitude || q.altitude_km != altitude_km) {
            trace!("Recomputing spherical coordinates and Legendre functions for latitude {latitude}°, altitude {altitude_km} km");
            self.spherical = SphericalCoordinates::from_geodetic(latitude, altitude_km);
            self.legendre = LegendreTable::new(
                self.spherical.cos_colat,
                self.spherical.sin_colat,
                &self.factors.k,
            );
        }

        if last.map_or(true, |q| q.longitude != longitude) {
            trace!("Recomputing azimuthal terms for longitude {longitude}°");
            self.azimuthal = Azimuthal::new(longitude);
        }

        if last.map_or(true, |q| q.decimal_year != decimal_year) {
            if !self.coefficients.is_valid_for(decimal_year) {
                warn!(
                    "{decimal_year} is outside the validity window of {} ({} to {}); results are extrapolated",
                    self.coefficients.name,
                    self.coefficients.epoch,
                    self.coefficients.epoch + constants::MODEL_VALIDITY_YEARS
                );
            }
            trace!("Adjusting coefficients to {decimal_year}");
            self.time_adjust(decimal_year);
        }

        let (north, east, down) = self.sum_harmonics();
        self.field = GeomagneticField::from_components(north, east, down);
        self.last_query = Some(QueryState {
            longitude,
            latitude,
            altitude_km,
            decimal_year,
        });
        Ok(self.field)
    }

    fn time_adjust(&mut self, decimal_year: f64) {
        let dt = decimal_year - self.coefficients.epoch;
        let (c, cd, tc) = (&self.gauss, &self.gauss_secular, &mut self.time_adjusted);
        for n in 1..=MAX_DEG {
            for m in 0..=n {
                tc[m][n] = c[m][n] + dt * cd[m][n];
                if m != 0 {
                    tc[n][m - 1] = c[n][m - 1] + dt * cd[n][m - 1];
                }
            }
        }
    }

    /// Sum the expansion and rotate the result into geodetic (north, east,
    /// down) components.
    fn sum_harmonics(&self) -> (f64, f64, f64) {
        let tc = &self.time_adjusted;
        let (sp, cp) = (&self.azimuthal.sin, &self.azimuthal.cos);
        let LegendreTable { p, p_deriv, polar } = &self.legendre;
        let NormalizationFactors { degree, order, .. } = &self.factors;

        let aor = IAU66_RADIUS_KM / self.spherical.radius_km;
        let mut ar = aor * aor;
        let (mut br, mut bt, mut bp, mut bpp) = (0.0, 0.0, 0.0, 0.0);

        for n in 1..=MAX_DEG {
            ar *= aor;
            for m in 0..=n {
                let (temp1, temp2) = if m == 0 {
                    (tc[m][n] * cp[m], tc[m][n] * sp[m])
                } else {
                    (
                        tc[m][n] * cp[m] + tc[n][m - 1] * sp[m],
                        tc[m][n] * sp[m] - tc[n][m - 1] * cp[m],
                    )
                };

                let par = ar * p[m][n];
                bt -= ar * temp1 * p_deriv[m][n];
                bp += order[m] * temp2 * par;
                br += degree[n] * temp1 * par;

                if let (1, Some(pp)) = (m, polar) {
                    bpp += order[m] * temp2 * ar * pp[n];
                }
            }
        }

        let bp = match polar {
            Some(_) => bpp,
            None => bp / self.spherical.sin_colat,
        };

        let SphericalCoordinates {
            cos_rot, sin_rot, ..
        } = self.spherical;
        let north = -bt * cos_rot - br * sin_rot;
        let east = bp;
        let down = bt * sin_rot - br * cos_rot;
        (north, east, down)
    }

    /// The field from the last successful evaluation. All NaN before the first.
    pub fn field(&self) -> GeomagneticField {
        self.field
    }

    pub fn declination(&self) -> f64 {
        self.field.declination
    }

    pub fn inclination(&self) -> f64 {
        self.field.inclination
    }

    pub fn intensity(&self) -> f64 {
        self.field.intensity
    }

    pub fn horizontal_intensity(&self) -> f64 {
        self.field.horizontal_intensity
    }

    pub fn vertical_intensity(&self) -> f64 {
        self.field.vertical_intensity
    }

    pub fn north_intensity(&self) -> f64 {
        self.field.north_intensity
    }

    pub fn east_intensity(&self) -> f64 {
        self.field.east_intensity
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use time::Month;

    use super::*;

    fn wmm() -> Geomagnetism {
        Geomagnetism::wmm2015().unwrap()
    }

    #[test]
    fn test_get_declination() {
        let mut g = wmm();
        g.calculate_at_decimal_year(0.0, 80.0, 0.0, 2015.0).unwrap();
        assert_float_eq!(g.declination(), -3.85, abs <= 0.005);
        assert_float_eq!(g.inclination(), 83.04, abs <= 0.005);
        assert_float_eq!(g.intensity(), 54836.0, abs <= 0.05);
        assert_float_eq!(g.horizontal_intensity(), 6642.1, abs <= 0.05);
        assert_float_eq!(g.north_intensity(), 6627.1, abs <= 0.05);
        assert_float_eq!(g.east_intensity(), -445.9, abs <= 0.06);
        assert_float_eq!(g.vertical_intensity(), 54432.3, abs <= 0.05);
    }

    #[test]
    fn test_unset_before_first_evaluation() {
        let g = wmm();
        assert!(g.declination().is_nan());
        assert!(g.inclination().is_nan());
        assert!(g.intensity().is_nan());
        assert!(g.horizontal_intensity().is_nan());
        assert!(g.vertical_intensity().is_nan());
        assert!(g.north_intensity().is_nan());
        assert!(g.east_intensity().is_nan());
    }

    #[test]
    fn test_accessors_match_returned_field() {
        let mut g = wmm();
        let f = g.calculate_at_decimal_year(120.0, 0.0, 100_000.0, 2017.5).unwrap();
        assert_eq!(g.field(), f);
        assert_eq!(g.declination(), f.declination);
        assert_eq!(g.east_intensity(), f.east_intensity);
    }

    #[test]
    fn test_cache_does_not_change_results() {
        let mut fresh = wmm();
        let expected = fresh.calculate_at_decimal_year(-97.3, 33.2, 250.0, 2016.2).unwrap();

        let mut g = wmm();
        g.calculate_at_decimal_year(10.0, -45.0, 5000.0, 2019.0).unwrap();
        g.calculate_at_decimal_year(-97.3, -45.0, 5000.0, 2016.2).unwrap();
        g.calculate_at_decimal_year(-97.3, 33.2, 5000.0, 2018.0).unwrap();
        let cached = g.calculate_at_decimal_year(-97.3, 33.2, 250.0, 2016.2).unwrap();
        assert_eq!(cached, expected);

        let again = g.calculate_at_decimal_year(-97.3, 33.2, 250.0, 2016.2).unwrap();
        assert_eq!(again, expected);
    }

    #[test]
    fn test_date_change_only_recomputes_time_terms() {
        let mut g = wmm();
        g.calculate_at_decimal_year(30.0, 50.0, 0.0, 2015.5).unwrap();
        let spherical = g.spherical;
        let azimuthal = g.azimuthal;
        let legendre = g.legendre.clone();
        let time_adjusted = g.time_adjusted;
        let before = g.field();

        g.calculate_at_decimal_year(30.0, 50.0, 0.0, 2018.5).unwrap();
        assert_eq!(g.spherical, spherical);
        assert_eq!(g.azimuthal, azimuthal);
        assert_eq!(g.legendre, legendre);
        assert_ne!(g.time_adjusted, time_adjusted);
        assert_ne!(g.field(), before);
        // g(1,0) drifts by 10.7 nT/yr.
        assert_float_eq!(
            g.time_adjusted[0][1] - time_adjusted[0][1],
            3.0 * 10.7,
            abs <= 1e-9
        );
    }

    #[test]
    fn test_longitude_change_keeps_latitude_terms() {
        let mut g = wmm();
        g.calculate_at_decimal_year(30.0, 50.0, 0.0, 2015.5).unwrap();
        let legendre = g.legendre.clone();
        let time_adjusted = g.time_adjusted;
        let azimuthal = g.azimuthal;

        g.calculate_at_decimal_year(-60.0, 50.0, 0.0, 2015.5).unwrap();
        assert_eq!(g.legendre, legendre);
        assert_eq!(g.time_adjusted, time_adjusted);
        assert_ne!(g.azimuthal, azimuthal);
    }

    #[test]
    fn test_poles_are_finite() {
        let mut g = wmm();
        for latitude in [90.0, -90.0] {
            let f = g.calculate_at_decimal_year(0.0, latitude, 0.0, 2015.0).unwrap();
            assert!(g.legendre.polar.is_some());
            for value in [
                f.declination,
                f.inclination,
                f.intensity,
                f.horizontal_intensity,
                f.north_intensity,
                f.east_intensity,
                f.vertical_intensity,
            ] {
                assert!(value.is_finite(), "{f:?}");
            }
        }

        let f = g.calculate_at_decimal_year(0.0, 90.0, 0.0, 2015.0).unwrap();
        assert_float_eq!(f.north_intensity, 1903.79, abs <= 0.01);
        assert_float_eq!(f.east_intensity, -205.10, abs <= 0.01);
        assert_float_eq!(f.vertical_intensity, 56607.82, abs <= 0.01);
    }

    #[test]
    fn test_polar_branch_is_continuous() {
        let mut g = wmm();
        let at_pole = g.calculate_at_decimal_year(37.0, 90.0, 0.0, 2015.0).unwrap();
        let near_pole = g.calculate_at_decimal_year(37.0, 89.9999, 0.0, 2015.0).unwrap();
        assert!(g.legendre.polar.is_none());
        // The vector is continuous; only its decomposition depends on longitude.
        assert_float_eq!(at_pole.intensity, near_pole.intensity, abs <= 0.1);
        assert_float_eq!(at_pole.horizontal_intensity, near_pole.horizontal_intensity, abs <= 0.1);
        assert_float_eq!(at_pole.vertical_intensity, near_pole.vertical_intensity, abs <= 0.1);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let mut g = wmm();
        let good = g.calculate_at_decimal_year(0.0, 0.0, 0.0, 2015.0).unwrap();
        let last_query = g.last_query;

        assert!(matches!(
            g.calculate_at_decimal_year(0.0, 90.5, 0.0, 2015.0),
            Err(InputError::InvalidLatitude(_))
        ));
        assert!(matches!(
            g.calculate_at_decimal_year(0.0, -91.0, 0.0, 2015.0),
            Err(InputError::InvalidLatitude(_))
        ));
        assert!(matches!(
            g.calculate_at_decimal_year(0.0, f64::NAN, 0.0, 2015.0),
            Err(InputError::InvalidLatitude(_))
        ));
        assert!(matches!(
            g.calculate_at_decimal_year(f64::INFINITY, 0.0, 0.0, 2015.0),
            Err(InputError::NonFiniteLongitude(_))
        ));
        assert!(matches!(
            g.calculate_at_decimal_year(0.0, 0.0, f64::NAN, 2015.0),
            Err(InputError::NonFiniteAltitude(_))
        ));
        assert!(matches!(
            g.calculate_at_decimal_year(0.0, 0.0, 0.0, f64::NEG_INFINITY),
            Err(InputError::NonFiniteYear(_))
        ));

        assert_eq!(g.field(), good);
        assert_eq!(g.last_query, last_query);
    }

    #[test]
    fn test_out_of_window_dates_extrapolate() {
        let mut g = wmm();
        let f = g.calculate_at_decimal_year(0.0, 0.0, 0.0, 2030.0).unwrap();
        assert!(f.intensity.is_finite());
        let f2 = g.calculate_at_decimal_year(0.0, 0.0, 0.0, 2015.0).unwrap();
        assert_ne!(f, f2);
    }

    #[test]
    fn test_calendar_date() {
        let mut g = wmm();
        let date = Date::from_calendar_date(2015, Month::January, 1).unwrap();
        let by_date = g.calculate(0.0, 0.0, 0.0, date).unwrap();
        let mut g2 = wmm();
        let by_year = g2.calculate_at_decimal_year(0.0, 0.0, 0.0, 2015.0).unwrap();
        assert_eq!(by_date, by_year);
    }

    #[test]
    fn test_calculate_now() {
        let mut g = wmm();
        let f = g.calculate_now(151.2, -33.9).unwrap();
        assert!(f.intensity.is_finite());
        assert_eq!(g.last_query.unwrap().altitude_km, 0.0);
    }
}
