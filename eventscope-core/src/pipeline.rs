//! Detect → ingest → aggregate, in-process or on a worker thread
//!
//! ```text
//!   Pipeline::run ─────────────► PipelineOutput
//!
//!   Pipeline::spawn ──► worker thread
//!                           │  Progress { percent } (every interval)
//!                           │  ...
//!                           ▼
//!                       Complete(output) | Failed(error)   (exactly one)
//!                           │
//!                           ▼
//!                      WorkerHandle::wait
//! ```
//!
//! Both paths call the same ingestion and aggregation code, so for the same
//! rows and configuration they produce identical output, and identical
//! errors: a worker that fails hands back the original [`Error`].
//! [`Error::Worker`] is reserved for a worker that dies without reporting.

use serde::Serialize;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use crate::aggregate::{AggregatedDataset, Aggregator, DEFAULT_SAMPLE_CAP};
use crate::datetime::Timezone;
use crate::error::{Error, Result};
use crate::ingest::{IngestOptions, RowIngestor};
use crate::types::RawRow;

/// Everything a pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Zone for offset-free timestamps, also used for hour/day buckets
    pub timezone: Timezone,
    pub ingest: IngestOptions,
    /// Upper bound on `dataset.sampled`
    pub sample_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timezone: Timezone::RuntimeDefault,
            ingest: IngestOptions::default(),
            sample_cap: DEFAULT_SAMPLE_CAP,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// Detected timestamp column
    pub column: String,
    /// Zone the timestamps were read in
    pub timezone: String,
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_dropped: usize,
    pub dataset: AggregatedDataset,
}

impl PipelineOutput {
    /// Serialize for machine consumers.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Message from a worker to its owner.
#[derive(Debug)]
pub enum PipelineMessage {
    /// Ingestion progress, 0-100
    Progress { percent: u8 },
    /// Terminal: the run succeeded
    Complete(Box<PipelineOutput>),
    /// Terminal: the run failed
    Failed(Error),
}

impl PipelineMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineMessage::Progress { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run to completion on the calling thread.
    pub fn run(&self, rows: Vec<RawRow>) -> Result<PipelineOutput> {
        self.run_with_progress(rows, |_| {})
    }

    /// Run on the calling thread, reporting ingestion progress.
    pub fn run_with_progress<F>(&self, rows: Vec<RawRow>, on_progress: F) -> Result<PipelineOutput>
    where
        F: FnMut(u8),
    {
        let ingestor = RowIngestor::with_options(self.config.timezone, self.config.ingest.clone());
        let report = ingestor.ingest_with_progress(rows, on_progress)?;

        let rows_read = report.rows_read;
        let rows_used = report.rows_used();
        let rows_dropped = report.rows_dropped;

        let dataset = Aggregator::new(self.config.sample_cap)
            .with_zone(self.config.timezone)
            .aggregate(report.rows);

        Ok(PipelineOutput {
            column: report.column,
            timezone: self.config.timezone.to_string(),
            rows_read,
            rows_used,
            rows_dropped,
            dataset,
        })
    }

    /// Move `rows` onto a new worker thread and run there.
    pub fn spawn(&self, rows: Vec<RawRow>) -> Result<WorkerHandle> {
        let (sender, receiver) = mpsc::channel();
        let pipeline = self.clone();

        let join = thread::Builder::new()
            .name("eventscope-worker".to_string())
            .spawn(move || {
                let progress = sender.clone();
                let result = pipeline.run_with_progress(rows, |percent| {
                    // Owner may have stopped listening; keep going regardless
                    let _ = progress.send(PipelineMessage::Progress { percent });
                });

                let message = match result {
                    Ok(output) => PipelineMessage::Complete(Box::new(output)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Pipeline worker failed");
                        PipelineMessage::Failed(e)
                    }
                };
                let _ = sender.send(message);
            })?;

        tracing::debug!("Spawned pipeline worker");
        Ok(WorkerHandle {
            receiver,
            join: Some(join),
        })
    }
}

/// Owner's end of a spawned pipeline run.
#[derive(Debug)]
pub struct WorkerHandle {
    receiver: Receiver<PipelineMessage>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Block for the next message. `None` once the worker has hung up.
    pub fn recv(&self) -> Option<PipelineMessage> {
        self.receiver.recv().ok()
    }

    /// All remaining messages, ending when the worker hangs up.
    pub fn messages(&self) -> impl Iterator<Item = PipelineMessage> + '_ {
        self.receiver.iter()
    }

    /// Block until the run finishes.
    pub fn wait(self) -> Result<PipelineOutput> {
        self.wait_with_progress(|_| {})
    }

    /// Block until the run finishes, forwarding progress to `on_progress`.
    pub fn wait_with_progress<F>(mut self, mut on_progress: F) -> Result<PipelineOutput>
    where
        F: FnMut(u8),
    {
        let mut outcome = None;
        for message in self.receiver.iter() {
            match message {
                PipelineMessage::Progress { percent } => on_progress(percent),
                PipelineMessage::Complete(output) => {
                    outcome = Some(Ok(*output));
                    break;
                }
                PipelineMessage::Failed(error) => {
                    outcome = Some(Err(error));
                    break;
                }
            }
        }

        let panicked = self
            .join
            .take()
            .map(|join| join.join().is_err())
            .unwrap_or(false);

        match outcome {
            Some(result) => result,
            None if panicked => Err(Error::Worker("worker thread panicked".to_string())),
            None => Err(Error::Worker(
                "worker exited without a result".to_string(),
            )),
        }
    }
}
