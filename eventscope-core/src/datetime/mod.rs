//! Datetime detection and parsing
//!
//! One side-effect-free module used by both the in-process pipeline and the
//! worker thread.
//!
//! ```text
//! FieldValue ──► parse (epoch / offset / wall-clock)
//!                  │
//!        ┌─────────┴──────────┐
//!        ▼                    ▼
//!    classify            timezone::resolve_in_timezone
//!        │                    │
//!        ▼                    ▼
//!    detect (column)      ingest (per row)
//! ```

pub mod classify;
pub mod detect;
pub mod parse;
pub mod timezone;

pub use classify::{classify, is_datetime, ClassifiedValue};
pub use detect::{
    analyze_column, detect_by_header, detect_datetime_column, ColumnAnalysis,
    DEFAULT_SAMPLE_SIZE, DETECTION_THRESHOLD,
};
pub use parse::ParsedDateTime;
pub use timezone::{resolve_in_timezone, Timezone};
