use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};

/// Length of a matchweek window: start and end are six days apart.
pub const MATCHWEEK_SPAN_DAYS: i64 = 6;

/// Calculate the difference between two dates in days
pub fn days_between(date1: NaiveDate, date2: NaiveDate) -> i64 {
    (date2 - date1).num_days()
}

/// Inclusive on both bounds.
pub fn date_in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

/// Whether a matchweek window covers exactly seven calendar days.
pub fn spans_matchweek(start: NaiveDate, end: NaiveDate) -> bool {
    days_between(start, end) == MATCHWEEK_SPAN_DAYS
}

/// Parse a content-store date field ("YYYY-MM-DD"). A full timestamp is
/// accepted too and truncated to its date.
pub fn parse_content_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_content_datetime(value).map(|dt| dt.date_naive()))
}

/// Parse a content-store datetime field (RFC 3339, e.g. "2024-08-17T14:00:00.000Z").
pub fn parse_content_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Long calendar-date label without a year, e.g. "Saturday, September 14".
pub fn day_label<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%A, %B %-d").to_string()
}

/// Same label for a bare calendar date.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

/// 24-hour kickoff time, e.g. "15:00".
pub fn kickoff_label<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}

/// Age in whole years on `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

pub fn utc_offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}
