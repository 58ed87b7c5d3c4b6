//! Descriptive statistics over row values, and a time-based summary for
//! rows that carry no value of their own.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of a set of values.
///
/// `std_dev` is the population standard deviation. Quartiles are taken by
/// index into the sorted values (`q1 = sorted[floor(n * 0.25)]`), no
/// interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub q1: f64,
    pub q3: f64,
}

/// Summarize `values`. Non-finite values are ignored; `None` if nothing remains.
pub fn summarize(values: &[f64]) -> Option<Statistics> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    // Welford
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, value) in sorted.iter().enumerate() {
        let delta = value - mean;
        mean += delta / (i + 1) as f64;
        m2 += delta * (value - mean);
    }

    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    Some(Statistics {
        count: n,
        sum: sorted.iter().sum(),
        mean,
        median,
        min: sorted[0],
        max: sorted[n - 1],
        std_dev: (m2 / n as f64).sqrt(),
        q1: sorted[n / 4],
        q3: sorted[(n * 3) / 4],
    })
}

/// Summary of event timing, for datasets where every value is the 1.0 default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimestampSummary {
    pub total_events: usize,
    pub first_event: DateTime<Utc>,
    pub last_event: DateTime<Utc>,
    /// Mean gap between consecutive events, 0 for a single event
    pub avg_interval_seconds: f64,
    /// Events over the covered span; equals `total_events` when the span is zero
    pub events_per_hour: f64,
}

/// Summarize event timing. `None` for no timestamps.
pub fn summarize_timestamps(timestamps: &[DateTime<Utc>]) -> Option<TimestampSummary> {
    let first = *timestamps.iter().min()?;
    let last = *timestamps.iter().max()?;
    let n = timestamps.len();

    let span_seconds = (last - first).num_milliseconds() as f64 / 1000.0;
    let avg_interval_seconds = if n > 1 {
        span_seconds / (n - 1) as f64
    } else {
        0.0
    };
    let events_per_hour = if span_seconds > 0.0 {
        n as f64 / (span_seconds / 3600.0)
    } else {
        n as f64
    };

    Some(TimestampSummary {
        total_events: n,
        first_event: first,
        last_event: last,
        avg_interval_seconds,
        events_per_hour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_empty() {
        assert_eq!(summarize(&[]), None);
        assert_eq!(summarize(&[f64::NAN]), None);
    }

    #[test]
    fn test_single_value() {
        let stats = summarize(&[4.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.q1, 4.0);
        assert_eq!(stats.q3, 4.0);
    }

    #[test]
    fn test_known_values() {
        let stats = summarize(&[9.0, 2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.sum, 40.0);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert_eq!(stats.median, 4.5);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        // sorted: 2 4 4 4 5 5 7 9
        assert_eq!(stats.q1, 4.0);
        assert_eq!(stats.q3, 7.0);
    }

    #[test]
    fn test_odd_median() {
        let stats = summarize(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.0);
    }

    #[test]
    fn test_timestamp_summary() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        // Out of order on purpose
        let timestamps = vec![
            start + Duration::hours(2),
            start,
            start + Duration::minutes(30),
            start + Duration::hours(1),
        ];

        let summary = summarize_timestamps(&timestamps).unwrap();
        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.first_event, start);
        assert_eq!(summary.last_event, start + Duration::hours(2));
        // 7200s over 3 gaps
        assert_eq!(summary.avg_interval_seconds, 2400.0);
        assert_eq!(summary.events_per_hour, 2.0);
    }

    #[test]
    fn test_timestamp_summary_without_span() {
        assert_eq!(summarize_timestamps(&[]), None);

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let single = summarize_timestamps(&[at]).unwrap();
        assert_eq!(single.total_events, 1);
        assert_eq!(single.avg_interval_seconds, 0.0);
        assert_eq!(single.events_per_hour, 1.0);

        let burst = summarize_timestamps(&[at, at, at]).unwrap();
        assert_eq!(burst.avg_interval_seconds, 0.0);
        assert_eq!(burst.events_per_hour, 3.0);
    }
}
