//! Reading `WMM.COF` coefficient tables and converting them from Schmidt
//! semi-normalised to unnormalised form.

use log::debug;

use crate::{
    constants::{MAX_DEG, MODEL_VALIDITY_YEARS, TABLE_SIZE, WMM2015_COF},
    CoefficientError,
};

/// A square table indexed `[m][n]` (order, degree).
pub(crate) type Table = [[f64; TABLE_SIZE]; TABLE_SIZE];

/// Gauss coefficients of a World Magnetic Model release, as published.
///
/// `gauss[m][n]` holds g(n, m) and `gauss_secular[m][n]` its yearly rate. The
/// h(n, m) terms (m > 0) are kept in the otherwise unused transposed slot
/// `[n][m - 1]` of the same tables.
#[derive(Clone, Debug, PartialEq)]
pub struct Coefficients {
    pub(crate) gauss: Table,
    pub(crate) gauss_secular: Table,
    pub(crate) epoch: f64,
    pub(crate) name: String,
    pub(crate) release_date: Option<String>,
}

impl Coefficients {
    /// The bundled WMM-2015 release.
    pub fn wmm2015() -> Result<Self, CoefficientError> {
        Self::from_cof(WMM2015_COF)
    }

    /// Parse the contents of a `WMM.COF` file.
    ///
    /// The first non-blank line is the header (`epoch name release-date`),
    /// every following line is `n m gnm hnm dgnm dhnm`. A line of nines ends
    /// the data. Every degree/order pair up to degree 12 must be present
    /// exactly once.
    pub fn from_cof(contents: &str) -> Result<Self, CoefficientError> {
        let mut lines = contents
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header) = lines.next().ok_or(CoefficientError::Empty)?;
        let mut header_fields = header.split_whitespace();
        let epoch = header_fields
            .next()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|e| e.is_finite())
            .ok_or_else(|| CoefficientError::InvalidEpoch(header.to_string()))?;
        let name = header_fields.next().unwrap_or_default().to_string();
        let release_date = header_fields.next().map(str::to_string);

        let mut gauss = [[0.0; TABLE_SIZE]; TABLE_SIZE];
        let mut gauss_secular = [[0.0; TABLE_SIZE]; TABLE_SIZE];
        // Indexed [n][m].
        let mut seen = [[false; TABLE_SIZE]; TABLE_SIZE];

        for (line, text) in lines {
            if text.starts_with("9999") {
                break;
            }

            let fields: Vec<&str> = text.split_whitespace().collect();
            if fields.len() != 6 {
                return Err(CoefficientError::ColumnCount {
                    line,
                    found: fields.len(),
                });
            }

            let n = parse_index(fields[0], line)?;
            let m = parse_index(fields[1], line)?;
            if n == 0 || n > MAX_DEG {
                return Err(CoefficientError::DegreeOutOfRange { line, n });
            }
            if m > n {
                return Err(CoefficientError::OrderExceedsDegree { line, n, m });
            }
            if seen[n][m] {
                return Err(CoefficientError::Duplicate { line, n, m });
            }
            seen[n][m] = true;

            let mut values = [0.0; 4];
            for (value, field) in values.iter_mut().zip(&fields[2..]) {
                *value = field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CoefficientError::NotANumber {
                        line,
                        value: field.to_string(),
                    })?;
            }
            let [gnm, hnm, dgnm, dhnm] = values;

            gauss[m][n] = gnm;
            gauss_secular[m][n] = dgnm;
            if m != 0 {
                gauss[n][m - 1] = hnm;
                gauss_secular[n][m - 1] = dhnm;
            }
        }

        for n in 1..=MAX_DEG {
            for m in 0..=n {
                if !seen[n][m] {
                    return Err(CoefficientError::Missing { n, m });
                }
            }
        }

        debug!("Read coefficients for model '{name}' (epoch {epoch})");
        Ok(Self {
            gauss,
            gauss_secular,
            epoch,
            name,
            release_date,
        })
    }

    /// The decimal year at which the main field coefficients apply.
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// The model name from the file header, e.g. "WMM-2015". Empty if the
    /// header didn't have one.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The release date from the file header, verbatim.
    pub fn release_date(&self) -> Option<&str> {
        self.release_date.as_deref()
    }

    /// Is the decimal year inside the five years this release covers?
    pub fn is_valid_for(&self, decimal_year: f64) -> bool {
        (self.epoch..self.epoch + MODEL_VALIDITY_YEARS).contains(&decimal_year)
    }

    /// Rescale the coefficients by the Schmidt factors, giving the
    /// unnormalised (main, secular) tables used with unnormalised Legendre
    /// functions.
    pub(crate) fn unnormalise(&self, factors: &NormalizationFactors) -> (Table, Table) {
        let mut gauss = self.gauss;
        let mut gauss_secular = self.gauss_secular;
        for n in 1..=MAX_DEG {
            for m in 0..=n {
                let s = factors.schmidt[m][n];
                if m > 0 {
                    gauss[n][m - 1] *= s;
                    gauss_secular[n][m - 1] *= s;
                }
                gauss[m][n] *= s;
                gauss_secular[m][n] *= s;
            }
        }
        debug!("Converted '{}' coefficients to unnormalised form", self.name);
        (gauss, gauss_secular)
    }
}

fn parse_index(field: &str, line: usize) -> Result<usize, CoefficientError> {
    field
        .parse()
        .map_err(|_| CoefficientError::InvalidIndex {
            line,
            value: field.to_string(),
        })
}

/// Scalars derived from the shape of the expansion only. They rescale the
/// coefficients once and drive the Legendre recursion on every evaluation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NormalizationFactors {
    /// Schmidt quasi-normalisation factors, `[m][n]`.
    pub(crate) schmidt: Table,

    /// Three-term recursion factors `((n-1)^2 - m^2) / ((2n-1)(2n-3))`, `[m][n]`.
    pub(crate) k: Table,

    /// `n + 1`, by degree.
    pub(crate) degree: [f64; TABLE_SIZE],

    /// `m`, by order.
    pub(crate) order: [f64; TABLE_SIZE],
}

impl NormalizationFactors {
    pub(crate) fn new() -> Self {
        let mut schmidt = [[0.0; TABLE_SIZE]; TABLE_SIZE];
        let mut k = [[0.0; TABLE_SIZE]; TABLE_SIZE];
        let mut degree = [0.0; TABLE_SIZE];
        let mut order = [0.0; TABLE_SIZE];

        schmidt[0][0] = 1.0;
        for n in 1..=MAX_DEG {
            schmidt[0][n] = schmidt[0][n - 1] * (2 * n - 1) as f64 / n as f64;
            for m in 0..=n {
                let (nf, mf) = (n as f64, m as f64);
                k[m][n] =
                    ((nf - 1.0) * (nf - 1.0) - mf * mf) / ((2.0 * nf - 1.0) * (2.0 * nf - 3.0));
                if m > 0 {
                    let j = if m == 1 { 2.0 } else { 1.0 };
                    let flnmj = ((n - m + 1) as f64 * j) / (n + m) as f64;
                    schmidt[m][n] = schmidt[m - 1][n] * flnmj.sqrt();
                }
            }
            degree[n] = (n + 1) as f64;
            order[n] = n as f64;
        }
        k[1][1] = 0.0;
        order[0] = 0.0;

        Self {
            schmidt,
            k,
            degree,
            order,
        }
    }
}
