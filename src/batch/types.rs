//! Batch data model: jobs, statuses, summaries, and status-change events.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use pixport_common::{ImageFormat, JobId};
use serde::{Deserialize, Serialize};

/// Lifecycle of one conversion job.
///
/// Transitions are monotonic: `Pending` → `Processing` → one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// True once a job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Why a job failed.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "lowercase")]
pub enum JobError {
    /// The request was rejected before the collaborator was invoked.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The conversion collaborator reported an error.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// The collaborator did not answer within the per-item deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl JobError {
    /// True for the deadline-expiry kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, JobError::Timeout(_))
    }
}

/// A successful conversion output, ready for export.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub job_id: JobId,
    /// Name of the source file the output was derived from.
    pub source_name: String,
    pub format: ImageFormat,
    pub bytes: Bytes,
    pub converted_at: DateTime<Utc>,
}

/// One (source, target-format) conversion request tracked by the runner.
///
/// Jobs are created when a file is admitted to a batch and mutated only by
/// the runner that owns the batch.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: JobId,
    pub source_name: String,
    pub source: Bytes,
    pub source_format: ImageFormat,
    pub target_format: ImageFormat,
    pub status: JobStatus,
    pub result: Option<ConvertedImage>,
    pub error: Option<JobError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ConversionJob {
    /// Admit a source into a batch.
    pub fn new(
        source_name: impl Into<String>,
        source: Bytes,
        source_format: ImageFormat,
        target_format: ImageFormat,
    ) -> Self {
        Self {
            id: JobId::new(),
            source_name: source_name.into(),
            source,
            source_format,
            target_format,
            status: JobStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn complete(&mut self, bytes: Bytes) {
        let finished = Utc::now();
        self.result = Some(ConvertedImage {
            job_id: self.id,
            source_name: self.source_name.clone(),
            format: self.target_format,
            bytes,
            converted_at: finished,
        });
        self.status = JobStatus::Completed;
        self.finished_at = Some(finished);
    }

    pub(crate) fn fail(&mut self, error: JobError) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    /// Mark the job cancelled. Any result that arrives afterwards is
    /// discarded by never being stored.
    pub(crate) fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.finished_at = Some(Utc::now());
    }
}

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Deadline for a single conversion call.
    pub job_timeout: Duration,
    /// Optional pause between items, for hosts that want the loop to
    /// breathe between allocation-heavy conversions.
    pub inter_job_delay: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(30),
            inter_job_delay: None,
        }
    }
}

/// Outcome of one batch run.
///
/// Every job carries exactly one terminal status, so
/// `completed + failed + cancelled == total()`.
#[derive(Debug)]
pub struct BatchSummary {
    pub jobs: Vec<ConversionJob>,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Number of jobs in the batch.
    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    /// The successful outputs, in job order. Feeds the export service.
    pub fn completed_outputs(&self) -> impl Iterator<Item = &ConvertedImage> {
        self.jobs.iter().filter_map(|job| job.result.as_ref())
    }
}

/// Status-change notifications for a UI layer.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    JobStarted {
        job_id: JobId,
        source_name: String,
    },
    JobCompleted {
        job_id: JobId,
    },
    JobFailed {
        job_id: JobId,
        error: String,
    },
    JobCancelled {
        job_id: JobId,
    },
    BatchFinished {
        completed: usize,
        failed: usize,
        cancelled: usize,
    },
}
