//! Batch conversion orchestration.
//!
//! One [`BatchRunner`] drives an ordered job list through a per-item state
//! machine: strictly sequential execution, a deadline per conversion call,
//! cooperative cancellation, and per-item failure isolation. Status changes
//! are optionally broadcast as [`BatchEvent`]s for a UI layer; the runner
//! itself never renders anything.

mod runner;
mod types;

pub use runner::BatchRunner;
pub use types::{
    BatchEvent, BatchOptions, BatchSummary, ConversionJob, ConvertedImage, JobError, JobStatus,
};
