//! Parsing of user-supplied time filters for history queries.
//!
//! Accepted forms:
//! - RFC 3339 (`2024-03-01T12:00:00Z`)
//! - Local date or date-time (`2024-03-01`, `2024-03-01 12:30`, `2024-03-01 12:30:05`)
//! - Keywords `now`, `today`, `yesterday` (local midnight)
//! - Relative durations back from now (`30m`, `2h`, `3d`, `1w`)

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use thiserror::Error;

/// Errors from parsing a time filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeFilterError {
    /// Input matched none of the accepted forms.
    #[error("unrecognized time {0:?}: use RFC 3339, YYYY-MM-DD, today, yesterday, or a duration like 2h")]
    Unrecognized(String),

    /// Input parsed but does not map to a representable instant.
    #[error("time {0:?} is out of range")]
    OutOfRange(String),
}

/// Parse a time filter relative to the current local time.
pub fn parse_time_filter(input: &str) -> Result<DateTime<Utc>, TimeFilterError> {
    parse_time_filter_at(input, Local::now())
}

/// Parse a time filter relative to `now`, interpreting dates in `now`'s zone.
pub fn parse_time_filter_at<Tz: TimeZone>(
    input: &str,
    now: DateTime<Tz>,
) -> Result<DateTime<Utc>, TimeFilterError> {
    let raw = input.trim();
    let lower = raw.to_ascii_lowercase();
    let out_of_range = || TimeFilterError::OutOfRange(raw.to_string());

    match lower.as_str() {
        "now" => return Ok(now.with_timezone(&Utc)),
        "today" => return local_midnight(&now, now.date_naive()).ok_or_else(out_of_range),
        "yesterday" => {
            let day = now.date_naive().pred_opt().ok_or_else(out_of_range)?;
            return local_midnight(&now, day).ok_or_else(out_of_range);
        }
        _ => {}
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return in_zone(&now, naive).ok_or_else(out_of_range);
        }
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return local_midnight(&now, day).ok_or_else(out_of_range);
    }

    if let Some(delta) = parse_relative(&lower) {
        let delta = delta.ok_or_else(out_of_range)?;
        return now
            .with_timezone(&Utc)
            .checked_sub_signed(delta)
            .ok_or_else(out_of_range);
    }

    Err(TimeFilterError::Unrecognized(raw.to_string()))
}

fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>, day: NaiveDate) -> Option<DateTime<Utc>> {
    in_zone(now, day.and_time(NaiveTime::MIN))
}

fn in_zone<Tz: TimeZone>(now: &DateTime<Tz>, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `Some(None)` means the input looked relative but overflowed.
fn parse_relative(input: &str) -> Option<Option<TimeDelta>> {
    let split = input.find(|c: char| !c.is_ascii_digit())?;
    if split == 0 {
        return None;
    }
    let (digits, unit) = input.split_at(split);
    let n: i64 = match digits.parse() {
        Ok(n) => n,
        Err(_) => return Some(None),
    };
    let delta = match unit {
        "m" | "min" | "mins" => TimeDelta::try_minutes(n),
        "h" | "hr" | "hrs" => TimeDelta::try_hours(n),
        "d" | "day" | "days" => TimeDelta::try_days(n),
        "w" | "wk" | "wks" => TimeDelta::try_weeks(n),
        _ => return None,
    };
    Some(delta)
}
