//! # eventscope-core
//!
//! Core library for eventscope - a time-series explorer for tabular event data.
//!
//! This library provides:
//! - Datetime classification, column detection and timezone resolution
//! - Row ingestion into timestamped, valued rows
//! - Aggregation into sorted, sampled and time-bucketed datasets
//! - A pipeline that runs in-process or on a worker thread
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three stages:
//! - **Read:** CSV text becomes ordered [`RawRow`]s
//! - **Ingest:** one column is detected as the timestamp; every row is
//!   resolved to an instant and a numeric value, or dropped
//! - **Aggregate:** rows are sorted, stride-sampled and bucketed by hour,
//!   weekday and calendar day
//!
//! ## Example
//!
//! ```rust,no_run
//! use eventscope_core::{csv_input, Config, Pipeline};
//!
//! let config = Config::load().expect("failed to load config");
//! let pipeline = Pipeline::new(config.pipeline.to_pipeline_config());
//!
//! let rows = csv_input::read_path("events.csv".as_ref()).expect("failed to read CSV");
//! let output = pipeline.run(rows).expect("no datetime column");
//! println!("{} of {} rows used", output.rows_used, output.rows_read);
//! ```

// Re-export commonly used items at the crate root
pub use aggregate::{aggregate, AggregatedDataset, Aggregator};
pub use config::Config;
pub use datetime::Timezone;
pub use error::{Error, Result};
pub use ingest::{ingest, IngestReport, RowIngestor};
pub use pipeline::{Pipeline, PipelineConfig, PipelineMessage, PipelineOutput, WorkerHandle};
pub use types::*;

// Public modules
pub mod aggregate;
pub mod config;
pub mod csv_input;
pub mod datetime;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod types;
