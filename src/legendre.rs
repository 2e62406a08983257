//! Unnormalised associated Legendre functions and their colatitude
//! derivatives.

use crate::{
    coefficients::Table,
    constants::{MAX_DEG, TABLE_SIZE},
};

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct LegendreTable {
    /// P(n, m), indexed `[m][n]`.
    pub(crate) p: Table,

    /// dP(n, m)/dθ, indexed `[m][n]`.
    pub(crate) p_deriv: Table,

    /// P(n, 1)/sin(θ) by degree. Only present at the geographic poles, where
    /// the azimuthal component can't be divided by sin(θ).
    pub(crate) polar: Option<[f64; TABLE_SIZE]>,
}

impl LegendreTable {
    /// `cos_colat` and `sin_colat` are of the geocentric colatitude θ, `k`
    /// are the recursion factors from
    /// [`NormalizationFactors`](crate::coefficients::NormalizationFactors).
    pub(crate) fn new(cos_colat: f64, sin_colat: f64, k: &Table) -> Self {
        let (ct, st) = (cos_colat, sin_colat);
        let mut t = LegendreTable::default();
        t.p[0][0] = 1.0;

        for n in 1..=MAX_DEG {
            for m in 0..=n {
                if n == m {
                    t.p[m][n] = st * t.p[m - 1][n - 1];
                    t.p_deriv[m][n] = st * t.p_deriv[m - 1][n - 1] + ct * t.p[m - 1][n - 1];
                } else if n == 1 {
                    t.p[0][1] = ct * t.p[0][0];
                    t.p_deriv[0][1] = ct * t.p_deriv[0][0] - st * t.p[0][0];
                } else {
                    // Just below the diagonal, degree n - 2 has no order m term.
                    let (p2, p_deriv2) = if m + 2 > n {
                        (0.0, 0.0)
                    } else {
                        (t.p[m][n - 2], t.p_deriv[m][n - 2])
                    };
                    t.p[m][n] = ct * t.p[m][n - 1] - k[m][n] * p2;
                    t.p_deriv[m][n] =
                        ct * t.p_deriv[m][n - 1] - st * t.p[m][n - 1] - k[m][n] * p_deriv2;
                }
            }
        }

        if st == 0.0 {
            t.polar = Some(polar_order_one(ct, k));
        }
        t
    }
}

fn polar_order_one(ct: f64, k: &Table) -> [f64; TABLE_SIZE] {
    let mut pp = [0.0; TABLE_SIZE];
    pp[0] = 1.0;
    pp[1] = pp[0];
    for n in 2..=MAX_DEG {
        pp[n] = ct * pp[n - 1] - k[1][n] * pp[n - 2];
    }
    pp
}
