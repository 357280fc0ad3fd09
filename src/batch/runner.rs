//! Sequential batch runner.
//!
//! Jobs execute strictly in list order, one at a time: the conversion
//! collaborator is assumed non-reentrant and allocation-heavy per call, so
//! serial execution bounds peak memory. Each call runs under a deadline;
//! failures and timeouts are recorded on the job and the batch continues.
//! Cancellation is cooperative and advisory: the token is checked before
//! each job starts, the in-flight call is never interrupted, and a result
//! that arrives after cancellation is discarded.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::convert::{ConvertRequest, ImageConverter};

use super::types::{BatchEvent, BatchOptions, BatchSummary, ConversionJob, JobError, JobStatus};

/// Drives one batch of conversion jobs to completion.
pub struct BatchRunner {
    converter: Arc<dyn ImageConverter>,
    event_tx: Option<broadcast::Sender<BatchEvent>>,
}

impl BatchRunner {
    /// Create a runner around a conversion collaborator.
    pub fn new(converter: Arc<dyn ImageConverter>) -> Self {
        Self {
            converter,
            event_tx: None,
        }
    }

    /// Create a runner that also broadcasts status-change events.
    pub fn with_events(
        converter: Arc<dyn ImageConverter>,
        event_tx: broadcast::Sender<BatchEvent>,
    ) -> Self {
        Self {
            converter,
            event_tx: Some(event_tx),
        }
    }

    /// Broadcast an event if an event sender is configured.
    fn broadcast(&self, event: BatchEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                debug!("No subscribers for batch event");
            }
        }
    }

    /// Run every job in list order and return the batch summary.
    ///
    /// The cancellation token may be triggered by the caller at any time.
    /// Once set, jobs not yet started are marked cancelled without being
    /// attempted; an in-flight job is marked cancelled when its call
    /// returns, and its result is discarded.
    pub async fn run(
        &self,
        mut jobs: Vec<ConversionJob>,
        options: &BatchOptions,
        cancel: &CancellationToken,
    ) -> BatchSummary {
        let started = Instant::now();
        info!(total = jobs.len(), "Batch started");

        let mut first = true;
        for job in jobs.iter_mut() {
            // Pacing sits before the cancellation check so a flag raised
            // during the pause still stops the next job from starting.
            if !first && !cancel.is_cancelled() {
                tokio::task::yield_now().await;
                if let Some(delay) = options.inter_job_delay {
                    tokio::time::sleep(delay).await;
                }
            }
            first = false;

            if cancel.is_cancelled() {
                job.cancel();
                info!(job_id = %job.id, name = %job.source_name, "Job cancelled before start");
                self.broadcast(BatchEvent::JobCancelled { job_id: job.id });
                continue;
            }

            self.run_job(job, options, cancel).await;
        }

        let mut completed = 0;
        let mut failed = 0;
        let mut cancelled = 0;
        for job in &jobs {
            match job.status {
                JobStatus::Completed => completed += 1,
                JobStatus::Failed => failed += 1,
                JobStatus::Cancelled => cancelled += 1,
                JobStatus::Pending | JobStatus::Processing => {
                    // Every job was either attempted or marked cancelled above.
                    unreachable!("job left without a terminal status")
                }
            }
        }

        let elapsed = started.elapsed();
        info!(
            completed,
            failed,
            cancelled,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch finished"
        );
        self.broadcast(BatchEvent::BatchFinished {
            completed,
            failed,
            cancelled,
        });

        BatchSummary {
            jobs,
            completed,
            failed,
            cancelled,
            elapsed,
        }
    }

    /// Drive a single job to its terminal status.
    async fn run_job(
        &self,
        job: &mut ConversionJob,
        options: &BatchOptions,
        cancel: &CancellationToken,
    ) {
        job.start();
        info!(
            job_id = %job.id,
            name = %job.source_name,
            from = %job.source_format,
            to = %job.target_format,
            "Job started"
        );
        self.broadcast(BatchEvent::JobStarted {
            job_id: job.id,
            source_name: job.source_name.clone(),
        });

        if let Some(error) = validate(job) {
            warn!(job_id = %job.id, name = %job.source_name, %error, "Job failed validation");
            self.broadcast(BatchEvent::JobFailed {
                job_id: job.id,
                error: error.to_string(),
            });
            job.fail(error);
            return;
        }

        let request = ConvertRequest {
            bytes: job.source.clone(),
            source_format: job.source_format,
            target_format: job.target_format,
        };

        let outcome = timeout(options.job_timeout, self.converter.convert(request)).await;

        if cancel.is_cancelled() {
            // The flag was raised while the call was in flight; whatever the
            // collaborator produced is discarded.
            job.cancel();
            info!(job_id = %job.id, name = %job.source_name, "Job cancelled in flight");
            self.broadcast(BatchEvent::JobCancelled { job_id: job.id });
            return;
        }

        match outcome {
            Ok(Ok(bytes)) => {
                info!(job_id = %job.id, name = %job.source_name, out_bytes = bytes.len(), "Job completed");
                job.complete(bytes);
                self.broadcast(BatchEvent::JobCompleted { job_id: job.id });
            }
            Ok(Err(e)) => {
                let error = JobError::Conversion(e.to_string());
                warn!(job_id = %job.id, name = %job.source_name, %error, "Job failed");
                self.broadcast(BatchEvent::JobFailed {
                    job_id: job.id,
                    error: error.to_string(),
                });
                job.fail(error);
            }
            Err(_) => {
                // Deadline expired. The call is abandoned, not retried; if
                // the collaborator eventually answers, nobody is listening.
                let error = JobError::Timeout(options.job_timeout);
                warn!(job_id = %job.id, name = %job.source_name, %error, "Job timed out");
                self.broadcast(BatchEvent::JobFailed {
                    job_id: job.id,
                    error: error.to_string(),
                });
                job.fail(error);
            }
        }
    }
}

/// Reject requests the collaborator should never see.
fn validate(job: &ConversionJob) -> Option<JobError> {
    if job.source_format == job.target_format {
        return Some(JobError::Validation(format!(
            "{} is already in {} format",
            job.source_name, job.target_format
        )));
    }
    if job.source.is_empty() {
        return Some(JobError::Validation(format!(
            "{} is empty",
            job.source_name
        )));
    }
    None
}
