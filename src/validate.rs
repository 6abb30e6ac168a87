//! Business rules for a booking request.
//!
//! Each rule is a pure function. [`validate_request`] applies them in a fixed
//! order and reports the first one that fails, since callers show exactly one
//! message per request.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::calendar::{add_days, is_business_day};
use crate::limits::{BOOKING_WINDOW_DAYS, CLOSES_AT_MINUTE, OPENS_AT_MINUTE};
use crate::model::{DATE_FORMAT, TIME_FORMAT};

const TIME_MESSAGE: &str =
    "Ogiltigt tidsformat. Ange tiden i formatet HH:MM mellan 08:00 och 17:00.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", TIME_MESSAGE)]
    TimeFormat,
    #[error("{}", TIME_MESSAGE)]
    TimeRange,
    #[error("Ogiltigt datumformat. Ange datumet i formatet YYYY-MM-DD.")]
    DateFormat,
    #[error("Datumet ligger i det förflutna. Välj ett framtida datum.")]
    PastDate,
    #[error("Endast bokningar mellan måndag och fredag är tillåtna.")]
    Weekend,
    #[error("Datumet ligger för långt i framtiden. Välj ett datum denna vecka.")]
    Window,
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::TimeFormat => "time_format",
            ValidationError::TimeRange => "time_range",
            ValidationError::DateFormat => "date_format",
            ValidationError::PastDate => "past_date",
            ValidationError::Weekend => "weekend",
            ValidationError::Window => "outside_window",
        }
    }
}

/// True when `s` has exactly the digit/separator layout of `pattern`,
/// where `9` stands for any ASCII digit.
fn matches_layout(s: &str, pattern: &str) -> bool {
    s.len() == pattern.len()
        && s.bytes().zip(pattern.bytes()).all(|(c, p)| match p {
            b'9' => c.is_ascii_digit(),
            _ => c == p,
        })
}

/// Parse a zero-padded 24h `HH:MM`.
pub fn parse_time(tid: &str) -> Result<NaiveTime, ValidationError> {
    if !matches_layout(tid, "99:99") {
        return Err(ValidationError::TimeFormat);
    }
    NaiveTime::parse_from_str(tid, TIME_FORMAT).map_err(|_| ValidationError::TimeFormat)
}

/// Parsed time within opening hours, 08:00 to 17:00 inclusive.
pub fn check_time(tid: &str) -> Result<NaiveTime, ValidationError> {
    let time = parse_time(tid)?;
    let minute = time.hour() * 60 + time.minute();
    if !(OPENS_AT_MINUTE..=CLOSES_AT_MINUTE).contains(&minute) {
        return Err(ValidationError::TimeRange);
    }
    Ok(time)
}

pub fn validate_time(tid: &str) -> bool {
    check_time(tid).is_ok()
}

/// Parse a zero-padded `YYYY-MM-DD` that names a real calendar date.
pub fn validate_date(datum: &str) -> Result<NaiveDate, ValidationError> {
    if !matches_layout(datum, "9999-99-99") {
        return Err(ValidationError::DateFormat);
    }
    NaiveDate::parse_from_str(datum, DATE_FORMAT).map_err(|_| ValidationError::DateFormat)
}

pub fn validate_not_past(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}

pub fn validate_weekday(date: NaiveDate) -> bool {
    is_business_day(date)
}

/// At most `BOOKING_WINDOW_DAYS` calendar days ahead. Weekends inside the
/// window are rejected separately by [`validate_weekday`].
pub fn validate_window(date: NaiveDate, today: NaiveDate) -> bool {
    date <= add_days(today, BOOKING_WINDOW_DAYS as u64)
}

/// Run every rule in order: time, date format, not past, weekday, window.
pub fn validate_request(
    tid: &str,
    datum: &str,
    today: NaiveDate,
) -> Result<(NaiveTime, NaiveDate), ValidationError> {
    let time = check_time(tid)?;
    let date = validate_date(datum)?;
    if !validate_not_past(date, today) {
        return Err(ValidationError::PastDate);
    }
    if !validate_weekday(date) {
        return Err(ValidationError::Weekend);
    }
    if !validate_window(date, today) {
        return Err(ValidationError::Window);
    }
    Ok((time, date))
}
