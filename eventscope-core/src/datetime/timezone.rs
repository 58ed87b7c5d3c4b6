//! Timezone selection and wall-clock resolution
//!
//! A [`Timezone`] is either the runtime's local zone or a named IANA zone.
//! Offset-free datetime strings are read as wall-clock time in the selected
//! zone, with DST resolved for the specific calendar date.

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use std::fmt;

use super::parse::{self, ParsedDateTime};
use crate::error::{Error, Result};
use crate::types::FieldValue;

/// Identifiers that select the runtime's local zone.
const RUNTIME_DEFAULT_IDS: &[&str] = &["", "local", "browser", "default", "system"];

/// Civil timezone used to read offset-free timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timezone {
    /// Whatever zone the process runs in
    #[default]
    RuntimeDefault,
    /// A specific IANA zone (e.g. `America/New_York`)
    Named(Tz),
}

impl Timezone {
    /// Parse an identifier, degrading unknown names to the runtime default.
    ///
    /// An invalid identifier is logged and otherwise ignored; it never fails
    /// a row or a batch.
    pub fn from_id(id: &str) -> Self {
        match Self::parse_strict(id) {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(
                    timezone = %id,
                    "Invalid timezone, using runtime default"
                );
                Timezone::RuntimeDefault
            }
        }
    }

    /// Parse an identifier, rejecting unknown names.
    pub fn parse_strict(id: &str) -> Result<Self> {
        let trimmed = id.trim();
        if RUNTIME_DEFAULT_IDS
            .iter()
            .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
        {
            return Ok(Timezone::RuntimeDefault);
        }
        trimmed
            .parse::<Tz>()
            .map(Timezone::Named)
            .map_err(|_| Error::InvalidTimezone(id.to_string()))
    }

    /// The instant a wall-clock reading denotes in this zone.
    pub fn resolve_wall_clock(&self, naive: &NaiveDateTime) -> DateTime<Utc> {
        match self {
            Timezone::RuntimeDefault => localize(&Local, naive),
            Timezone::Named(tz) => localize(tz, naive),
        }
    }

    /// Offset of this zone at `instant`, in minutes behind UTC.
    ///
    /// Positive west of Greenwich: New York in winter is `300`.
    pub fn offset_minutes_at(&self, instant: DateTime<Utc>) -> i32 {
        let seconds_east = match self {
            Timezone::RuntimeDefault => instant
                .with_timezone(&Local)
                .offset()
                .fix()
                .local_minus_utc(),
            Timezone::Named(tz) => instant.with_timezone(tz).offset().fix().local_minus_utc(),
        };
        -seconds_east / 60
    }

    /// The wall-clock reading of `instant` in this zone.
    pub fn to_wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Timezone::RuntimeDefault => instant.with_timezone(&Local).naive_local(),
            Timezone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Format `instant` as wall-clock time in this zone.
    pub fn render(&self, instant: DateTime<Utc>, format: &str) -> String {
        self.to_wall_clock(instant).format(format).to_string()
    }

    /// Every IANA identifier the resolver understands.
    pub fn known_ids() -> impl Iterator<Item = &'static str> {
        chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name())
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timezone::RuntimeDefault => f.write_str("local"),
            Timezone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Pin a wall-clock reading to an instant in `zone`.
///
/// Fall-back overlaps take the earlier instant. Spring-forward gaps use the
/// offset in effect at the reading's UTC-equivalent moment, which moves the
/// result past the gap.
pub(crate) fn localize<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = zone.offset_from_utc_datetime(naive).fix();
            (*naive - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}

/// Resolve a raw cell to an instant, reading offset-free values in `timezone`.
///
/// Epochs and strings with an explicit offset are authoritative and ignore
/// the zone. Returns `None` when no calendar reading can be recovered.
pub fn resolve_in_timezone(value: &FieldValue, timezone: &Timezone) -> Option<DateTime<Utc>> {
    let text = value.to_text()?;

    if let Some(instant) = parse::parse_epoch(&text) {
        return Some(instant);
    }

    match timezone {
        Timezone::RuntimeDefault => parse::parse_generic(&text).map(|p| p.into_instant(timezone)),
        Timezone::Named(_) => {
            if parse::has_explicit_offset(&text) {
                return parse::parse_generic(&text).map(|p| p.into_instant(timezone));
            }
            if let Some(naive) = parse::decompose_calendar(&text) {
                return Some(timezone.resolve_wall_clock(&naive));
            }
            match parse::parse_generic(&text)? {
                ParsedDateTime::Absolute(instant) => Some(instant),
                ParsedDateTime::WallClock(naive) => Some(timezone.resolve_wall_clock(&naive)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_york() -> Timezone {
        Timezone::Named(chrono_tz::America::New_York)
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(Timezone::from_id("browser"), Timezone::RuntimeDefault);
        assert_eq!(Timezone::from_id("Local"), Timezone::RuntimeDefault);
        assert_eq!(Timezone::from_id(""), Timezone::RuntimeDefault);
        assert_eq!(
            Timezone::from_id("Europe/Berlin"),
            Timezone::Named(chrono_tz::Europe::Berlin)
        );
        assert_eq!(Timezone::from_id("UTC"), Timezone::Named(chrono_tz::UTC));
    }

    #[test]
    fn test_invalid_id_degrades() {
        assert_eq!(Timezone::from_id("Mars/Olympus"), Timezone::RuntimeDefault);
        assert!(matches!(
            Timezone::parse_strict("Mars/Olympus"),
            Err(Error::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_new_york_round_trip_in_summer() {
        let tz = new_york();
        let instant = resolve_in_timezone(&"2024-06-15 12:00:00".into(), &tz).unwrap();

        // EDT is UTC-4 in June
        assert_eq!(instant.to_rfc3339(), "2024-06-15T16:00:00+00:00");
        assert_eq!(tz.render(instant, "%Y-%m-%d %H:%M:%S"), "2024-06-15 12:00:00");
        assert_eq!(tz.offset_minutes_at(instant), 240);
    }

    #[test]
    fn test_new_york_winter_offset() {
        let tz = new_york();
        let instant = resolve_in_timezone(&"1/15/2024 9:00 AM".into(), &tz).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-01-15T14:00:00+00:00");
        assert_eq!(tz.offset_minutes_at(instant), 300);
    }

    #[test]
    fn test_explicit_offset_ignores_zone() {
        let instant = resolve_in_timezone(&"2024-06-15T12:00:00Z".into(), &new_york()).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-06-15T12:00:00+00:00");

        let instant =
            resolve_in_timezone(&"2024-06-15T12:00:00+02:00".into(), &new_york()).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-06-15T10:00:00+00:00");
    }

    #[test]
    fn test_epoch_ignores_zone() {
        let instant = resolve_in_timezone(&FieldValue::Number(1_718_452_800.0), &new_york());
        assert_eq!(instant.map(|i| i.timestamp()), Some(1_718_452_800));
    }

    #[test]
    fn test_generic_fallback_in_zone() {
        let tokyo = Timezone::Named(chrono_tz::Asia::Tokyo);
        let instant = resolve_in_timezone(&"Jan 15, 2024".into(), &tokyo).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-01-14T15:00:00+00:00");
    }

    #[test]
    fn test_unresolvable_values() {
        let tz = new_york();
        assert!(resolve_in_timezone(&"bad".into(), &tz).is_none());
        assert!(resolve_in_timezone(&FieldValue::Empty, &tz).is_none());
        assert!(resolve_in_timezone(&"2024-02-30 10:00:00".into(), &tz).is_none());
    }

    #[test]
    fn test_dst_gap_moves_forward() {
        // 02:30 does not exist in New York on 2024-03-10
        let naive = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let instant = new_york().resolve_wall_clock(&naive);
        assert_eq!(instant.to_rfc3339(), "2024-03-10T07:30:00+00:00");
        assert_eq!(
            new_york().render(instant, "%H:%M"),
            "03:30"
        );
    }

    #[test]
    fn test_dst_overlap_takes_earliest() {
        // 01:30 happens twice in New York on 2024-11-03
        let naive = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let instant = new_york().resolve_wall_clock(&naive);
        assert_eq!(instant.to_rfc3339(), "2024-11-03T05:30:00+00:00");
    }

    #[test]
    fn test_runtime_default_matches_local() {
        let naive = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let expected = localize(&Local, &naive);
        let resolved =
            resolve_in_timezone(&"2024-06-15 12:00:00".into(), &Timezone::RuntimeDefault);
        assert_eq!(resolved, Some(expected));
    }

    #[test]
    fn test_known_ids_include_common_zones() {
        let ids: Vec<_> = Timezone::known_ids().collect();
        assert!(ids.contains(&"America/New_York"));
        assert!(ids.contains(&"Asia/Kolkata"));
    }
}
