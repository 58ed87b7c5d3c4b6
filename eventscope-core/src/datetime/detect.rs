//! Pick the timestamp column of a dataset.

use super::classify::is_datetime;
use crate::types::RawRow;

/// Fraction of sampled values that must classify as datetimes.
pub const DETECTION_THRESHOLD: f64 = 0.8;

/// Rows inspected by [`detect_datetime_column`] unless configured otherwise.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Header fragments used by [`detect_by_header`].
const HEADER_HINTS: &[&str] = &["timestamp", "date", "time"];

/// Find the first column (in header order) whose sampled values look like datetimes.
///
/// Only the first `sample_size` rows are inspected. Column order comes from
/// the first row. A `sample_size` of zero is treated as one.
pub fn detect_datetime_column(rows: &[RawRow], sample_size: usize) -> Option<String> {
    let first = rows.first()?;
    let sample = &rows[..sample_size.max(1).min(rows.len())];
    let required = sample.len() as f64 * DETECTION_THRESHOLD;

    for column in first.columns() {
        let valid = sample
            .iter()
            .filter(|row| row.get(column).is_some_and(is_datetime))
            .count();

        if valid as f64 >= required {
            tracing::debug!(
                column = %column,
                valid,
                sampled = sample.len(),
                "Detected datetime column"
            );
            return Some(column.to_string());
        }
    }

    tracing::debug!(
        columns = first.len(),
        sampled = sample.len(),
        "No column met the datetime threshold"
    );
    None
}

/// Fall back to a column whose name suggests a timestamp.
///
/// Matches any header containing `timestamp`, `date` or `time`
/// (case-insensitive, so `@timestamp` too), first in header order.
///
/// This is a plain substring match, so names like `update_count` or
/// `runtime_ms` are picked as well. When no column has datetime content
/// such a pick still wins: ingestion then succeeds with every row dropped
/// rather than failing with [`Error::NoDateTimeColumn`].
///
/// [`Error::NoDateTimeColumn`]: crate::Error::NoDateTimeColumn
pub fn detect_by_header(rows: &[RawRow]) -> Option<String> {
    let first = rows.first()?;
    first
        .columns()
        .find(|name| {
            let lower = name.to_lowercase();
            HEADER_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .map(str::to_string)
}

/// Datetime coverage of one column over the whole dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnAnalysis {
    /// `valid_ratio >= DETECTION_THRESHOLD`
    pub is_datetime: bool,
    /// Share of non-empty values that classify as datetimes
    pub valid_ratio: f64,
}

/// Scan every row of `column`, ignoring empty cells.
pub fn analyze_column(rows: &[RawRow], column: &str) -> ColumnAnalysis {
    let mut non_empty = 0usize;
    let mut valid = 0usize;

    for value in rows.iter().filter_map(|row| row.get(column)) {
        if value.is_empty() {
            continue;
        }
        non_empty += 1;
        if is_datetime(value) {
            valid += 1;
        }
    }

    let valid_ratio = if non_empty > 0 {
        valid as f64 / non_empty as f64
    } else {
        0.0
    };

    ColumnAnalysis {
        is_datetime: valid_ratio >= DETECTION_THRESHOLD,
        valid_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    fn row(cells: &[(&str, FieldValue)]) -> RawRow {
        cells.iter().cloned().collect()
    }

    #[test]
    fn test_empty_dataset() {
        assert_eq!(detect_datetime_column(&[], DEFAULT_SAMPLE_SIZE), None);
        assert_eq!(detect_by_header(&[]), None);
    }

    #[test]
    fn test_first_qualifying_column_wins() {
        let rows: Vec<RawRow> = (0..5)
            .map(|i| {
                row(&[
                    ("id", FieldValue::from(i as i64)),
                    ("created", format!("2024-01-0{} 10:00:00", i + 1).into()),
                    ("updated", format!("2024-02-0{}T10:00:00Z", i + 1).into()),
                ])
            })
            .collect();

        assert_eq!(
            detect_datetime_column(&rows, DEFAULT_SAMPLE_SIZE).as_deref(),
            Some("created")
        );
    }

    #[test]
    fn test_threshold_is_eighty_percent() {
        // 8 of 10 valid qualifies
        let mut rows: Vec<RawRow> = (0..8)
            .map(|_| row(&[("when", "2024-01-01".into())]))
            .collect();
        rows.extend((0..2).map(|_| row(&[("when", "n/a".into())])));
        assert_eq!(detect_datetime_column(&rows, 10).as_deref(), Some("when"));

        // 7 of 10 does not
        rows[7] = row(&[("when", "n/a".into())]);
        assert_eq!(detect_datetime_column(&rows, 10), None);
    }

    #[test]
    fn test_only_the_sample_is_inspected() {
        let mut rows: Vec<RawRow> = (0..10)
            .map(|_| row(&[("when", "2024-01-01".into())]))
            .collect();
        rows.extend((0..100).map(|_| row(&[("when", "garbage".into())])));
        assert_eq!(detect_datetime_column(&rows, 10).as_deref(), Some("when"));
    }

    #[test]
    fn test_epoch_column_is_detectable() {
        let rows: Vec<RawRow> = (0..3)
            .map(|i| {
                row(&[
                    ("name", "x".into()),
                    ("ts", FieldValue::Number(1_704_067_200.0 + i as f64)),
                ])
            })
            .collect();
        assert_eq!(detect_datetime_column(&rows, 10).as_deref(), Some("ts"));
    }

    #[test]
    fn test_numeric_ids_are_not_dates() {
        let rows: Vec<RawRow> = (0..10)
            .map(|i| {
                row(&[
                    ("id", FieldValue::from(1000 + i as i64)),
                    ("count", FieldValue::from(i as i64)),
                ])
            })
            .collect();
        assert_eq!(detect_datetime_column(&rows, 10), None);
    }

    #[test]
    fn test_header_fallback() {
        let rows = vec![row(&[
            ("id", FieldValue::from(1i64)),
            ("Event Time", "soon".into()),
        ])];
        assert_eq!(detect_by_header(&rows).as_deref(), Some("Event Time"));

        let rows = vec![row(&[("id", FieldValue::from(1i64))])];
        assert_eq!(detect_by_header(&rows), None);
    }

    #[test]
    fn test_header_fallback_matches_substrings() {
        let rows = vec![row(&[
            ("id", FieldValue::from(1i64)),
            ("update_count", FieldValue::from(5i64)),
            ("runtime_ms", FieldValue::from(12i64)),
        ])];
        assert_eq!(detect_by_header(&rows).as_deref(), Some("update_count"));

        let rows = vec![row(&[("runtime_ms", FieldValue::from(12i64))])];
        assert_eq!(detect_by_header(&rows).as_deref(), Some("runtime_ms"));
    }

    #[test]
    fn test_analyze_column_ignores_empty() {
        let rows = vec![
            row(&[("when", "2024-01-01".into())]),
            row(&[("when", FieldValue::Empty)]),
            row(&[("when", "2024-01-02".into())]),
            row(&[("when", "oops".into())]),
        ];
        let analysis = analyze_column(&rows, "when");
        assert!((analysis.valid_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert!(!analysis.is_datetime);

        let missing = analyze_column(&rows, "nope");
        assert_eq!(missing.valid_ratio, 0.0);
        assert!(!missing.is_datetime);
    }
}
