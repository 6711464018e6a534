//! Date parsing and formatting

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::fmt::Write as _;

/// Formats that carry their own UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y/%m/%d %H:%M:%S %z",
];

/// Formats interpreted in the site timezone
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a front-matter date
///
/// Dates without an offset are placed in `tz`.
pub fn parse_date(s: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, tz);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(s, fmt) {
            return start_of_day(day, tz);
        }
    }

    None
}

/// Midnight of `day` in `tz`
pub fn start_of_day(day: NaiveDate, tz: Tz) -> Option<DateTime<FixedOffset>> {
    localize(day.and_hms_opt(0, 0, 0)?, tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Format a date with a strftime pattern
///
/// # Examples
/// ```ignore
/// format_date(&date, "%b %-d, %Y") // -> Ok("Sep 9, 2024")
/// ```
pub fn format_date(date: &DateTime<FixedOffset>, format: &str) -> Result<String, String> {
    let mut formatted = String::new();
    write!(formatted, "{}", date.format(format))
        .map_err(|_| format!("invalid date format {:?}", format))?;
    Ok(formatted)
}

/// Reject strftime patterns chrono cannot render
pub fn check_date_format(format: &str) -> Result<(), String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format {:?}", format));
    }
    Ok(())
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339()
}
