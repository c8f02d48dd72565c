//! Calendar arithmetic for monthly amortization
//!
//! Contract terms are calendar-dated (no time-of-day component). The plan
//! generator needs month stepping with day-of-month clamping (a contract
//! starting on the 31st is due on the 28th in a short February) and a month
//! count that rounds a partial final month up.
//!
//! All functions here are pure and deterministic.

use chrono::{Datelike, NaiveDate};

/// Number of days in the given calendar month
///
/// # Example
/// ```
/// use dormitory_core_rs::core::dates::days_in_month;
///
/// assert_eq!(days_in_month(2024, 2), 29); // leap year
/// assert_eq!(days_in_month(2025, 2), 28);
/// assert_eq!(days_in_month(2024, 1), 31);
/// ```
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| panic!("invalid year-month {}-{}", year, month));
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    };
    (next_first - first).num_days() as u32
}

/// Step a date forward by whole calendar months, clamping the day-of-month
///
/// The result keeps the original day-of-month where the target month is long
/// enough, and clamps to the last valid day otherwise.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::core::dates::add_months;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// assert_eq!(add_months(start, 1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// assert_eq!(add_months(start, 2), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
/// ```
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.year() as i64 * 12 + (date.month() as i64 - 1) + months as i64;
    let year = zero_based.div_euclid(12) as i32;
    let month = (zero_based.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid clamped date {}-{}-{}", year, month, day))
}

/// Count of whole clamped months that fit between `start` and `end`
///
/// Returns the largest `m` such that `add_months(start, m) <= end`.
/// Zero when `end <= start`.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::core::dates::full_months_between;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// assert_eq!(full_months_between(start, end), 12);
///
/// let mid = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
/// assert_eq!(full_months_between(start, mid), 5);
/// ```
pub fn full_months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }
    let mut m = (end.year() as i64 - start.year() as i64) * 12 + end.month() as i64
        - start.month() as i64;
    if m < 0 {
        m = 0;
    }
    while m > 0 && add_months(start, m as u32) > end {
        m -= 1;
    }
    while add_months(start, (m + 1) as u32) <= end {
        m += 1;
    }
    m as u32
}

/// Whether the term `[start, end)` has a partial month after the last whole one
pub fn has_partial_tail(start: NaiveDate, end: NaiveDate) -> bool {
    end > start && add_months(start, full_months_between(start, end)) < end
}

/// Number of billable months for a term: whole months, rounding a partial
/// final month up
///
/// This is the `number_of_months` used for the contract's total price.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::core::dates::number_of_months;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let whole = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// assert_eq!(number_of_months(start, whole), 12);
///
/// let partial = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
/// assert_eq!(number_of_months(start, partial), 6); // 5 whole + partial tail
/// ```
pub fn number_of_months(start: NaiveDate, end: NaiveDate) -> u32 {
    let full = full_months_between(start, end);
    if has_partial_tail(start, end) {
        full + 1
    } else {
        full
    }
}
