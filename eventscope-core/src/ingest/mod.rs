//! Ingestion layer: raw rows in, timestamped rows out
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │   Vec<RawRow>   │ ──► │   RowIngestor    │ ──► │  IngestReport   │
//! │  (CSV records)  │     │                  │     │ (IngestedRow[]) │
//! └─────────────────┘     └──────────────────┘     └─────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────────┐
//!                    │  datetime            │
//!                    │  ├─ detect (once)    │
//!                    │  └─ resolve (per row)│
//!                    └──────────────────────┘
//! ```
//!
//! Detection runs once per dataset: by content first, then by a
//! timestamp-sounding header name. If both find nothing the whole call fails
//! with [`Error::NoDateTimeColumn`]. Rows whose timestamp does not resolve
//! are dropped and only counted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eventscope_core::ingest::RowIngestor;
//! use eventscope_core::datetime::Timezone;
//!
//! let ingestor = RowIngestor::new(Timezone::from_id("America/New_York"));
//! let report = ingestor.ingest(rows)?;
//! println!("{} of {} rows used", report.rows_used(), report.rows_read);
//! ```

use crate::datetime::{self, Timezone, DEFAULT_SAMPLE_SIZE};
use crate::error::{Error, Result};
use crate::types::{IngestedRow, RawRow};

/// Rows between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Tunables for a [`RowIngestor`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Prefix rows inspected by column detection
    pub sample_size: usize,
    /// Fall back to a timestamp-sounding header when no column qualifies
    pub header_fallback: bool,
    /// Rows between progress callbacks
    pub progress_interval: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            header_fallback: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Result of ingesting one dataset.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Column the timestamps were read from (empty for an empty dataset)
    pub column: String,
    /// Rows that resolved, in input order
    pub rows: Vec<IngestedRow>,
    /// Rows handed to the ingestor
    pub rows_read: usize,
    /// Rows dropped because their timestamp did not resolve
    pub rows_dropped: usize,
}

impl IngestReport {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Turns raw rows into [`IngestedRow`]s.
///
/// The ingestor is responsible for:
/// - Detecting the timestamp column once per dataset
/// - Resolving each row's timestamp in the configured timezone
/// - Dropping rows that don't resolve
/// - Picking each row's numeric value
#[derive(Debug, Clone, Default)]
pub struct RowIngestor {
    timezone: Timezone,
    options: IngestOptions,
}

impl RowIngestor {
    /// Create an ingestor with default options.
    pub fn new(timezone: Timezone) -> Self {
        Self {
            timezone,
            options: IngestOptions::default(),
        }
    }

    /// Create an ingestor with custom options.
    pub fn with_options(timezone: Timezone, options: IngestOptions) -> Self {
        Self { timezone, options }
    }

    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    /// Pick the timestamp column, or fail the dataset.
    pub fn detect_column(&self, rows: &[RawRow]) -> Result<String> {
        if let Some(column) = datetime::detect_datetime_column(rows, self.options.sample_size) {
            return Ok(column);
        }

        if self.options.header_fallback {
            if let Some(column) = datetime::detect_by_header(rows) {
                tracing::info!(
                    column = %column,
                    "No column matched by content, using header name"
                );
                return Ok(column);
            }
        }

        Err(Error::NoDateTimeColumn {
            columns: rows.first().map(RawRow::len).unwrap_or(0),
        })
    }

    /// Ingest all rows.
    pub fn ingest(&self, rows: Vec<RawRow>) -> Result<IngestReport> {
        self.ingest_with_progress(rows, |_| {})
    }

    /// Ingest all rows, reporting percent complete.
    ///
    /// The callback receives a percentage (0-100) after every
    /// `progress_interval` rows. It is the natural place for a caller to
    /// yield or forward progress across a thread boundary.
    pub fn ingest_with_progress<F>(&self, rows: Vec<RawRow>, mut on_progress: F) -> Result<IngestReport>
    where
        F: FnMut(u8),
    {
        let rows_read = rows.len();
        if rows_read == 0 {
            return Ok(IngestReport::default());
        }

        let column = self.detect_column(&rows)?;
        let interval = self.options.progress_interval.max(1);
        let mut ingested = Vec::with_capacity(rows_read);

        for (i, row) in rows.into_iter().enumerate() {
            let timestamp = row
                .get(&column)
                .and_then(|value| datetime::resolve_in_timezone(value, &self.timezone));

            if let Some(timestamp) = timestamp {
                let value = select_value(&row, &column);
                ingested.push(IngestedRow {
                    timestamp,
                    value,
                    fields: row,
                });
            }

            let processed = i + 1;
            if processed % interval == 0 {
                on_progress(percent(processed, rows_read));
            }
        }

        let rows_dropped = rows_read - ingested.len();
        if rows_dropped > 0 {
            tracing::debug!(
                column = %column,
                rows_dropped,
                "Dropped rows with unparseable timestamps"
            );
        }
        tracing::info!(
            column = %column,
            timezone = %self.timezone,
            rows_read,
            rows_used = ingested.len(),
            "Ingestion complete"
        );

        Ok(IngestReport {
            column,
            rows: ingested,
            rows_read,
            rows_dropped,
        })
    }
}

/// Ingest with default options.
pub fn ingest(rows: Vec<RawRow>, timezone: &Timezone) -> Result<IngestReport> {
    RowIngestor::new(*timezone).ingest(rows)
}

/// First finite number in column order, skipping the timestamp column; else 1.
pub fn select_value(row: &RawRow, timestamp_column: &str) -> f64 {
    row.iter()
        .filter(|(name, _)| *name != timestamp_column)
        .find_map(|(_, value)| value.as_number())
        .unwrap_or(1.0)
}

fn percent(processed: usize, total: usize) -> u8 {
    ((processed as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;
    use chrono::{TimeZone, Utc};

    fn rows_from_json(json: &str) -> Vec<RawRow> {
        serde_json::from_str(json).unwrap()
    }

    fn utc() -> Timezone {
        Timezone::Named(chrono_tz::UTC)
    }

    #[test]
    fn test_drops_unparseable_rows() {
        let rows = rows_from_json(
            r#"[
                {"@timestamp":"2024-01-01T00:00:00Z","v":5},
                {"@timestamp":"2024-01-01T00:30:00Z","v":3},
                {"@timestamp":"bad"}
            ]"#,
        );

        let report = ingest(rows, &utc()).unwrap();
        assert_eq!(report.column, "@timestamp");
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_used(), 2);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.rows[0].value, 5.0);
        assert_eq!(
            report.rows[1].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_no_datetime_column() {
        let rows = rows_from_json(r#"[{"id":1,"n":2},{"id":2,"n":3},{"id":3,"n":4}]"#);
        let err = ingest(rows, &utc()).unwrap_err();
        assert!(matches!(err, Error::NoDateTimeColumn { columns: 2 }));
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let report = ingest(vec![], &utc()).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.rows_read, 0);
        assert!(report.column.is_empty());
    }

    #[test]
    fn test_header_fallback() {
        let rows = rows_from_json(r#"[{"id":1,"event_date":"someday"}]"#);
        let report = ingest(rows.clone(), &utc()).unwrap();
        assert_eq!(report.column, "event_date");
        assert_eq!(report.rows_used(), 0);
        assert_eq!(report.rows_dropped, 1);

        let options = IngestOptions {
            header_fallback: false,
            ..Default::default()
        };
        let err = RowIngestor::with_options(utc(), options)
            .ingest(rows)
            .unwrap_err();
        assert!(matches!(err, Error::NoDateTimeColumn { .. }));
    }

    #[test]
    fn test_numeric_header_hint_drops_every_row() {
        let rows = rows_from_json(
            r#"[{"id":1,"update_count":5},{"id":2,"update_count":6},{"id":3,"update_count":7}]"#,
        );
        let report = ingest(rows.clone(), &utc()).unwrap();
        assert_eq!(report.column, "update_count");
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_used(), 0);
        assert_eq!(report.rows_dropped, 3);

        let options = IngestOptions {
            header_fallback: false,
            ..Default::default()
        };
        let err = RowIngestor::with_options(utc(), options)
            .ingest(rows)
            .unwrap_err();
        assert!(matches!(err, Error::NoDateTimeColumn { columns: 2 }));
    }

    #[test]
    fn test_value_is_first_numeric_field_in_order() {
        let row: RawRow = vec![
            ("label", FieldValue::from("a")),
            ("ts", FieldValue::Number(1_704_067_200.0)),
            ("empty", FieldValue::Empty),
            ("second", FieldValue::Number(7.0)),
            ("third", FieldValue::Number(9.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(select_value(&row, "ts"), 7.0);
    }

    #[test]
    fn test_value_defaults_to_one() {
        let row: RawRow = vec![
            ("ts", FieldValue::Number(1_704_067_200.0)),
            ("note", FieldValue::from("hi")),
        ]
        .into_iter()
        .collect();
        assert_eq!(select_value(&row, "ts"), 1.0);
    }

    #[test]
    fn test_timezone_applies_to_naive_values() {
        let rows = rows_from_json(r#"[{"when":"2024-06-15 12:00:00"}]"#);
        let report = ingest(rows, &Timezone::Named(chrono_tz::America::New_York)).unwrap();
        assert_eq!(
            report.rows[0].timestamp,
            Utc.with_ymd_and_hms(2024, 6, 15, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_progress_every_interval() {
        let rows: Vec<RawRow> = (0..250)
            .map(|i| {
                vec![("ts", FieldValue::Number(1_704_067_200.0 + i as f64))]
                    .into_iter()
                    .collect()
            })
            .collect();

        let mut seen = Vec::new();
        let report = RowIngestor::new(utc())
            .ingest_with_progress(rows, |p| seen.push(p))
            .unwrap();

        assert_eq!(report.rows_used(), 250);
        assert_eq!(seen, vec![40, 80]);
    }
}
