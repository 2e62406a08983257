use time::{util::days_in_year, Date};

/// Convert a calendar date to a decimal year (2020-07-02 -> 2020.5).
///
/// 1 January is always exactly the integer year; each day adds 1/365 or
/// 1/366 depending on the length of the year.
pub fn decimal_year(date: Date) -> f64 {
    let year = date.year();
    year as f64 + (date.ordinal() - 1) as f64 / days_in_year(year) as f64
}
