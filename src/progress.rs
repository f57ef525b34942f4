//! Year progress arithmetic.
//!
//! Everything here is pure over a timestamp and its time zone. Day counts are
//! measured in elapsed wall time, so a year is 365 or 366 days long and a DST
//! shift inside the year only moves the fractional part of "now".

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearProgress {
    /// Elapsed share of the year, 0 at New Year's midnight.
    pub progress_percent: f64,
    /// Whole days left, counting the partial current day as a full one.
    pub days_remaining: u32,
    pub year: i32,
    pub total_days: f64,
}

/// Midnight on Jan 1 of `year` in `tz`.
///
/// When local midnight does not exist (a DST gap), the same wall time read as
/// UTC is used instead.
pub fn start_of_year<Tz: TimeZone>(tz: &Tz, year: i32) -> Option<DateTime<Tz>> {
    let midnight = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| Some(tz.from_utc_datetime(&midnight)))
}

fn days_between<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> f64 {
    to.clone()
        .signed_duration_since(from.clone())
        .num_milliseconds() as f64
        / MILLIS_PER_DAY
}

pub fn compute_progress<Tz: TimeZone>(now: &DateTime<Tz>) -> YearProgress {
    let tz = now.timezone();
    let year = now.year();

    let start = start_of_year(&tz, year).unwrap_or_else(|| now.clone());
    let end = start_of_year(&tz, year + 1)
        .unwrap_or_else(|| start.clone() + Duration::days(i64::from(year_length_days(year))));

    let total_days = days_between(&start, &end);
    let days_passed = days_between(&start, now);

    let progress_percent = if total_days > 0.0 {
        100.0 * days_passed / total_days
    } else {
        0.0
    };
    let days_remaining = (total_days - days_passed).ceil().max(0.0) as u32;

    YearProgress {
        progress_percent,
        days_remaining,
        year,
        total_days,
    }
}

/// Whole days since Jan 1 midnight of `now`'s year.
///
/// Read from its own timestamp at render time, so it can trail or lead the
/// value implied by the last [`compute_progress`] by the refresh skew.
pub fn days_passed_whole<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    match start_of_year(&now.timezone(), now.year()) {
        Some(start) => days_between(&start, now).floor() as i64,
        None => 0,
    }
}

/// Calendar length of `year` under proleptic Gregorian leap rules.
pub fn year_length_days(year: i32) -> u32 {
    match NaiveDate::from_ymd_opt(year, 2, 29) {
        Some(_) => 366,
        None => 365,
    }
}
