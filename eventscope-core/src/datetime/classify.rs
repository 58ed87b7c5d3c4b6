//! Decide whether a single cell holds a date/time.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::parse;
use super::timezone::Timezone;
use crate::types::FieldValue;

/// Shapes a cell must match before generic parsing is trusted.
static DATE_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // ISO 8601
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?Z?$",
        r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d{1,9})?$",
        // Dates
        r"^\d{4}-\d{2}-\d{2}$",
        r"^\d{2}/\d{2}/\d{4}$",
        r"^\d{1,2}/\d{1,2}/\d{4}$",
        r"^\d{4}/\d{2}/\d{2}$",
        // Dates with time of day
        r"(?i)^\d{1,2}/\d{1,2}/\d{4} \d{1,2}:\d{2}(:\d{2})?( [AP]M)?$",
        r"^\d{4}-\d{2}-\d{2} \d{1,2}:\d{2}(:\d{2})?$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid regex"))
    .collect()
});

/// Exclusive year bounds for values accepted only by generic parsing.
const FALLBACK_MIN_YEAR: i32 = 1900;
const FALLBACK_MAX_YEAR: i32 = 2100;

/// Result of classifying one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedValue {
    Valid(DateTime<Utc>),
    NotDateTime,
}

impl ClassifiedValue {
    pub fn is_valid(&self) -> bool {
        matches!(self, ClassifiedValue::Valid(_))
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            ClassifiedValue::Valid(instant) => Some(*instant),
            ClassifiedValue::NotDateTime => None,
        }
    }
}

/// Classify a cell, reading offset-free values in the runtime's local zone.
///
/// 1. Empty cells are never datetimes.
/// 2. 10-digit and 13-digit integers are Unix seconds and milliseconds.
/// 3. A known shape that also parses is accepted.
/// 4. Anything else that parses is accepted only for years 1901..=2099, so
///    stray numbers and codes don't pass as dates.
pub fn classify(value: &FieldValue) -> ClassifiedValue {
    let Some(text) = value.to_text() else {
        return ClassifiedValue::NotDateTime;
    };

    if let Some(instant) = parse::parse_epoch(&text) {
        return ClassifiedValue::Valid(instant);
    }

    let zone = Timezone::RuntimeDefault;

    if DATE_SHAPES.iter().any(|shape| shape.is_match(&text)) {
        if let Some(parsed) = parse::parse_generic(&text) {
            return ClassifiedValue::Valid(parsed.into_instant(&zone));
        }
    }

    match parse::parse_generic(&text) {
        Some(parsed) if parsed.year() > FALLBACK_MIN_YEAR && parsed.year() < FALLBACK_MAX_YEAR => {
            ClassifiedValue::Valid(parsed.into_instant(&zone))
        }
        _ => ClassifiedValue::NotDateTime,
    }
}

/// Shorthand for `classify(value).is_valid()`.
pub fn is_datetime(value: &FieldValue) -> bool {
    classify(value).is_valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ten_digit_epoch_is_seconds() {
        for secs in [1_000_000_000_i64, 1_704_067_200, 9_999_999_999] {
            let text = secs.to_string();
            assert_eq!(
                classify(&FieldValue::from(text.as_str())).instant().map(|i| i.timestamp_millis()),
                Some(secs * 1000),
                "input {text}"
            );
        }
    }

    #[test]
    fn test_thirteen_digit_epoch_is_millis() {
        for millis in [1_000_000_000_000_i64, 1_704_067_200_123, 9_999_999_999_999] {
            let text = millis.to_string();
            assert_eq!(
                classify(&FieldValue::from(text.as_str())).instant().map(|i| i.timestamp_millis()),
                Some(millis),
                "input {text}"
            );
        }
    }

    #[test]
    fn test_numeric_epoch_cell() {
        let value = FieldValue::Number(1_704_067_200.0);
        assert_eq!(
            classify(&value),
            ClassifiedValue::Valid(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_iso_utc() {
        assert_eq!(
            classify(&"2024-01-15T10:30:00Z".into()),
            ClassifiedValue::Valid(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_rejects_non_dates() {
        for input in ["not-a-date", "99/99/9999", "hello world", "42", "3.14", "ABC-123"] {
            assert_eq!(
                classify(&input.into()),
                ClassifiedValue::NotDateTime,
                "input {input}"
            );
        }
        assert_eq!(classify(&FieldValue::Empty), ClassifiedValue::NotDateTime);
        assert_eq!(classify(&FieldValue::Number(7.0)), ClassifiedValue::NotDateTime);
    }

    #[test]
    fn test_accepts_common_shapes() {
        for input in [
            "2024-01-15",
            "2024-01-15 10:30:00",
            "2024-01-15 9:30",
            "01/15/2024",
            "1/5/2024",
            "2024/01/15",
            "1/15/2024 2:30 PM",
            "1/15/2024 14:30:00",
            "  2024-01-15T10:30:00.123Z  ",
        ] {
            assert!(is_datetime(&input.into()), "input {input}");
        }
    }

    #[test]
    fn test_fallback_year_bounds() {
        assert!(is_datetime(&"Jan 15, 2024".into()));
        assert!(!is_datetime(&"Jan 15, 1850".into()));
        assert!(!is_datetime(&"Jan 15, 2150".into()));
        // Shape-matched values skip the year bound
        assert!(is_datetime(&"1850-01-15".into()));
    }
}
