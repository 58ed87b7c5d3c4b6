//! Aggregation of ingested rows for interactive redraws
//!
//! Provides, from one sort and one pass:
//! - The full time-sorted row set
//! - A bounded stride sample
//! - Hour-of-day, calendar-day and day-of-week buckets (count + mean value)
//!
//! Plus helpers for consumers that need their own reductions:
//! [`subset`], [`aggregate_by_window`] and [`stats::summarize`].

pub mod stats;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::datetime::Timezone;
use crate::types::IngestedRow;

pub use stats::{summarize, summarize_timestamps, Statistics, TimestampSummary};

/// Maximum length of [`AggregatedDataset::sampled`] unless configured otherwise.
pub const DEFAULT_SAMPLE_CAP: usize = 500;

/// Default point budget for [`subset`] consumers such as heatmaps.
pub const DEFAULT_SUBSET_POINTS: usize = 1000;

/// Count and running mean of a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketStats {
    pub count: usize,
    pub avg_value: f64,
}

impl BucketStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.avg_value += (value - self.avg_value) / self.count as f64;
    }
}

/// A calendar-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyBucket {
    pub count: usize,
    pub avg_value: f64,
    /// Midnight of the day in the bucket zone
    pub day_start: DateTime<Utc>,
}

/// Everything a chart layer needs, precomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedDataset {
    /// All rows, ascending by timestamp (stable for equal timestamps)
    pub full: Vec<IngestedRow>,
    /// Stride subsequence of `full`, at most the sample cap long
    pub sampled: Vec<IngestedRow>,
    /// Hour of day (0-23)
    pub hourly: BTreeMap<u32, BucketStats>,
    /// ISO date (`YYYY-MM-DD`)
    pub daily: BTreeMap<String, DailyBucket>,
    /// Day of week (0=Sunday, 6=Saturday)
    pub weekly: BTreeMap<u32, BucketStats>,
}

impl AggregatedDataset {
    /// Hour with the most rows (earliest hour on ties).
    pub fn peak_hour(&self) -> Option<u32> {
        max_count(&self.hourly)
    }

    /// Weekday with the most rows (earliest day on ties).
    pub fn busiest_weekday(&self) -> Option<u32> {
        max_count(&self.weekly)
    }

    /// Values of every row in time order.
    pub fn values(&self) -> Vec<f64> {
        self.full.iter().map(|row| row.value).collect()
    }

    /// True when there are rows and none had a numeric field, so every value
    /// is the 1.0 default.
    pub fn is_timestamp_only(&self) -> bool {
        !self.full.is_empty() && self.full.iter().all(|row| row.value == 1.0)
    }

    /// Event timing summary, only for timestamp-only datasets.
    pub fn timestamp_summary(&self) -> Option<TimestampSummary> {
        if !self.is_timestamp_only() {
            return None;
        }
        let timestamps: Vec<DateTime<Utc>> = self.full.iter().map(|row| row.timestamp).collect();
        summarize_timestamps(&timestamps)
    }
}

fn max_count(buckets: &BTreeMap<u32, BucketStats>) -> Option<u32> {
    buckets
        .iter()
        .rev()
        .max_by_key(|(_, stats)| stats.count)
        .map(|(key, _)| *key)
}

/// Sorts, samples and buckets ingested rows.
#[derive(Debug, Clone)]
pub struct Aggregator {
    sample_cap: usize,
    zone: Timezone,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            zone: Timezone::Named(chrono_tz::UTC),
        }
    }
}

impl Aggregator {
    /// UTC buckets with the given sample cap.
    pub fn new(sample_cap: usize) -> Self {
        Self {
            sample_cap,
            ..Default::default()
        }
    }

    /// Read hours, weekdays and days in `zone` instead of UTC.
    pub fn with_zone(mut self, zone: Timezone) -> Self {
        self.zone = zone;
        self
    }

    pub fn sample_cap(&self) -> usize {
        self.sample_cap
    }

    /// Build the dataset. Empty input gives empty output.
    pub fn aggregate(&self, mut rows: Vec<IngestedRow>) -> AggregatedDataset {
        rows.sort_by_key(|row| row.timestamp);

        let sampled = subset(&rows, self.sample_cap);
        let mut hourly: BTreeMap<u32, BucketStats> = BTreeMap::new();
        let mut daily: BTreeMap<String, DailyBucket> = BTreeMap::new();
        let mut weekly: BTreeMap<u32, BucketStats> = BTreeMap::new();

        for row in &rows {
            let wall = self.zone.to_wall_clock(row.timestamp);

            hourly.entry(wall.hour()).or_default().add(row.value);
            weekly
                .entry(wall.weekday().num_days_from_sunday())
                .or_default()
                .add(row.value);

            let day = wall.date();
            let bucket = daily
                .entry(day.format("%Y-%m-%d").to_string())
                .or_insert_with(|| DailyBucket {
                    count: 0,
                    avg_value: 0.0,
                    day_start: self.day_start(day),
                });
            bucket.count += 1;
            bucket.avg_value += (row.value - bucket.avg_value) / bucket.count as f64;
        }

        tracing::debug!(
            rows = rows.len(),
            sampled = sampled.len(),
            days = daily.len(),
            "Aggregated dataset"
        );

        AggregatedDataset {
            full: rows,
            sampled,
            hourly,
            daily,
            weekly,
        }
    }

    fn day_start(&self, day: NaiveDate) -> DateTime<Utc> {
        self.zone.resolve_wall_clock(&day.and_time(chrono::NaiveTime::MIN))
    }
}

/// Aggregate with the default cap, bucketing in UTC.
pub fn aggregate(rows: Vec<IngestedRow>) -> AggregatedDataset {
    Aggregator::default().aggregate(rows)
}

/// Deterministic stride subset of at most `max_points` rows.
///
/// `stride = ceil(n / max_points)`; keeps every index divisible by the
/// stride, so the first row is always kept and order is preserved. A
/// `max_points` of zero is treated as one.
pub fn subset(rows: &[IngestedRow], max_points: usize) -> Vec<IngestedRow> {
    if rows.is_empty() {
        return Vec::new();
    }
    let stride = rows.len().div_ceil(max_points.max(1));
    rows.iter().step_by(stride).cloned().collect()
}

/// A fixed-width time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowBucket {
    /// Window start (epoch-aligned)
    pub start: DateTime<Utc>,
    pub avg_value: f64,
    pub count: usize,
}

/// Group rows into epoch-aligned windows of width `window`.
///
/// Only windows containing rows are returned, in time order.
pub fn aggregate_by_window(rows: &[IngestedRow], window: Duration) -> Vec<WindowBucket> {
    let width = window.num_milliseconds().max(1);
    let mut points: Vec<(i64, f64)> = rows
        .iter()
        .map(|row| (row.timestamp.timestamp_millis(), row.value))
        .collect();
    points.sort_by_key(|(millis, _)| *millis);

    let mut buckets: Vec<WindowBucket> = Vec::new();
    let mut current: Option<(i64, f64, usize)> = None;

    for (millis, value) in points {
        let start = millis.div_euclid(width) * width;
        match current.as_mut() {
            Some((window_start, sum, count)) if *window_start == start => {
                *sum += value;
                *count += 1;
            }
            _ => {
                if let Some(done) = current.take() {
                    buckets.extend(finish_window(done));
                }
                current = Some((start, value, 1));
            }
        }
    }
    if let Some(done) = current {
        buckets.extend(finish_window(done));
    }

    buckets
}

fn finish_window((start, sum, count): (i64, f64, usize)) -> Option<WindowBucket> {
    Some(WindowBucket {
        start: DateTime::from_timestamp_millis(start)?,
        avg_value: sum / count as f64,
        count,
    })
}

/// Get day name from index (0=Sunday).
pub fn weekday_name(day: u32) -> &'static str {
    match day {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Unknown",
    }
}

/// Get hour display (e.g., "10am–11am").
pub fn hour_display(hour: u32) -> String {
    let hour = hour % 24;
    let h = hour % 12;
    let h = if h == 0 { 12 } else { h };
    let period = if hour < 12 { "am" } else { "pm" };
    let next = (hour + 1) % 24;
    let next_h = next % 12;
    let next_h = if next_h == 0 { 12 } else { next_h };
    let next_period = if next < 12 { "am" } else { "pm" };
    format!("{}{}–{}{}", h, period, next_h, next_period)
}
