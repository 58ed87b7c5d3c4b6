//! Generic datetime parsing shared by classification and timezone resolution.
//!
//! Parsing never consults a timezone. A string either carries its own offset
//! (and becomes [`ParsedDateTime::Absolute`]) or it is a wall-clock reading
//! that still needs a zone ([`ParsedDateTime::WallClock`]).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::timezone::Timezone;

static EPOCH_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("Invalid regex"));

static EPOCH_MILLIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{13}$").expect("Invalid regex"));

static NUMERIC_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]\d{2}:\d{2}").expect("Invalid regex"));

/// `YYYY-MM-DD[( |T)H:MM[:SS[.fff]]]`
static ISO_CALENDAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?$",
    )
    .expect("Invalid regex")
});

/// `M/D/YYYY[ h:mm[:ss][ AM|PM]]`
static US_CALENDAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AP]M))?)?$",
    )
    .expect("Invalid regex")
});

/// Formats carrying their own offset, tried after `Z` is normalized to `+00:00`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

const WALL_CLOCK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a %b %d %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%a %b %d %Y",
];

/// Outcome of generic parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDateTime {
    /// The input named its own offset (or was an epoch)
    Absolute(DateTime<Utc>),
    /// Calendar reading with no zone attached
    WallClock(NaiveDateTime),
}

impl ParsedDateTime {
    /// Pin the value to an instant, reading wall-clock values in `zone`.
    pub fn into_instant(self, zone: &Timezone) -> DateTime<Utc> {
        match self {
            ParsedDateTime::Absolute(instant) => instant,
            ParsedDateTime::WallClock(naive) => zone.resolve_wall_clock(&naive),
        }
    }

    /// Calendar year as written (UTC year for absolute values).
    pub fn year(&self) -> i32 {
        match self {
            ParsedDateTime::Absolute(instant) => instant.year(),
            ParsedDateTime::WallClock(naive) => naive.year(),
        }
    }
}

/// Unix seconds (10 digits) or milliseconds (13 digits). Always UTC.
pub fn parse_epoch(text: &str) -> Option<DateTime<Utc>> {
    if EPOCH_SECONDS.is_match(text) {
        let secs: i64 = text.parse().ok()?;
        return DateTime::from_timestamp(secs, 0);
    }
    if EPOCH_MILLIS.is_match(text) {
        let millis: i64 = text.parse().ok()?;
        return DateTime::from_timestamp_millis(millis);
    }
    None
}

/// Whether the string names its own offset (`Z` or `±HH:MM`).
pub fn has_explicit_offset(text: &str) -> bool {
    text.contains('Z') || NUMERIC_OFFSET.is_match(text)
}

/// Parse any supported representation without applying a timezone.
pub fn parse_generic(text: &str) -> Option<ParsedDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(instant) = parse_epoch(text) {
        return Some(ParsedDateTime::Absolute(instant));
    }

    if let Some(instant) = parse_with_offset(text) {
        return Some(ParsedDateTime::Absolute(instant));
    }

    for format in WALL_CLOCK_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ParsedDateTime::WallClock(naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(ParsedDateTime::WallClock);
        }
    }

    None
}

fn parse_with_offset(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = match text.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => text.to_string(),
    };
    OFFSET_FORMATS.iter().find_map(|format| {
        DateTime::parse_from_str(&normalized, format)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Split an offset-free string into calendar components.
///
/// Only the ISO-like and US slash layouts are decomposed here; everything
/// else goes through [`parse_generic`].
pub fn decompose_calendar(text: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = ISO_CALENDAR.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        let hour = capture_u32(&caps, 4).unwrap_or(0);
        let minute = capture_u32(&caps, 5).unwrap_or(0);
        let second = capture_u32(&caps, 6).unwrap_or(0);
        let nanos = caps.get(7).and_then(|m| fraction_to_nanos(m.as_str())).unwrap_or(0);
        return NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_nano_opt(hour, minute, second, nanos);
    }

    if let Some(caps) = US_CALENDAR.captures(text) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        let hour = capture_u32(&caps, 4).unwrap_or(0);
        let minute = capture_u32(&caps, 5).unwrap_or(0);
        let second = capture_u32(&caps, 6).unwrap_or(0);
        let hour = match caps.get(7) {
            Some(meridiem) => to_24_hour(hour, meridiem.as_str())?,
            None => hour,
        };
        return NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second);
    }

    None
}

fn capture_u32(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn fraction_to_nanos(digits: &str) -> Option<u32> {
    let padded = format!("{digits:0<9}");
    padded.parse().ok()
}

fn to_24_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if hour == 0 || hour > 12 {
        return None;
    }
    let pm = meridiem.eq_ignore_ascii_case("PM");
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    })
}
