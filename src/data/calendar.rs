//! Expiry-date calendar arithmetic.
//!
//! Monthly option contracts expire on a fixed Friday of the month; the two
//! conventions in use here are the third Friday (traditional equity/index
//! expiry) and the last Friday (crypto monthly contracts).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Third Friday of the given month.
///
/// `None` only when `year`/`month` do not form a valid date.
pub fn third_friday(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days_until_friday = (Weekday::Fri.num_days_from_monday() + 7
        - first.weekday().num_days_from_monday())
        % 7;
    Some(first + Duration::days(days_until_friday as i64 + 14))
}

/// Last Friday of the given month.
pub fn last_friday(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)? - Duration::days(1);
    let days_since_friday = (last.weekday().num_days_from_monday() + 7
        - Weekday::Fri.num_days_from_monday())
        % 7;
    Some(last - Duration::days(days_since_friday as i64))
}
