//! Single-consumer job loop over the worker queue.
//!
//! Delivery is at-least-once: a message is acked only after its run
//! completed, so any failure leaves it to reappear once the visibility
//! timeout lapses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use prospector_core::{AppConfig, AudienceRegistry};
use prospector_db::DbError;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::queue::{Job, JobDefaults, JobQueue};
use crate::store::ProspectStore;
use crate::workflow::WebsiteProspector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Nothing was waiting.
    Idle,
    Completed { msg_id: i64, run_id: Uuid },
    /// Left on the queue for redelivery.
    Failed { msg_id: i64 },
    /// Acked without running: the payload was unreadable, the audience is
    /// unknown, or the run it names can no longer start.
    Discarded { msg_id: i64 },
}

pub struct Worker {
    prospector: WebsiteProspector,
    queue: Arc<dyn JobQueue>,
    defaults: JobDefaults,
    visibility_timeout_secs: i32,
    poll_interval: Duration,
}

impl Worker {
    #[must_use]
    pub fn new(prospector: WebsiteProspector, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            prospector,
            queue,
            defaults: JobDefaults::default(),
            visibility_timeout_secs: 300,
            poll_interval: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.defaults = JobDefaults::from_config(config);
        self.visibility_timeout_secs = config.queue_visibility_timeout_secs;
        self.poll_interval = Duration::from_millis(config.queue_poll_interval_ms);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Receive and process at most one job.
    ///
    /// # Errors
    ///
    /// Returns an error only when the queue itself cannot be read or acked.
    /// Workflow failures are reported as [`JobOutcome::Failed`].
    pub async fn run_once(&self) -> anyhow::Result<JobOutcome> {
        let Some(queued) = self.queue.receive(self.visibility_timeout_secs).await? else {
            return Ok(JobOutcome::Idle);
        };
        let msg_id = queued.msg_id;

        let job: Job = match serde_json::from_value(queued.payload) {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(msg_id, error = %err, "discarding undecodable job payload");
                self.queue.ack(msg_id).await?;
                return Ok(JobOutcome::Discarded { msg_id });
            }
        };

        let request = job.into_request(&self.defaults);
        tracing::info!(
            msg_id,
            read_count = queued.read_count,
            audience = %request.audience_name,
            location = %request.location,
            "processing job"
        );

        match self.prospector.run(&request).await {
            Ok(report) => {
                self.queue.ack(msg_id).await?;
                tracing::info!(msg_id, run_id = %report.run_id, "job completed");
                Ok(JobOutcome::Completed {
                    msg_id,
                    run_id: report.run_id,
                })
            }
            Err(err) if is_unstartable(&err) => {
                tracing::warn!(
                    msg_id,
                    error = %err.detailed_message(),
                    "run can no longer start, discarding job"
                );
                self.queue.ack(msg_id).await?;
                Ok(JobOutcome::Discarded { msg_id })
            }
            Err(err) => {
                tracing::error!(
                    msg_id,
                    read_count = queued.read_count,
                    error = %err.detailed_message(),
                    "job failed, leaving message for redelivery"
                );
                Ok(JobOutcome::Failed { msg_id })
            }
        }
    }

    /// Process jobs until `shutdown` resolves.
    ///
    /// Shutdown is observed between jobs and while idle; a job in progress
    /// always runs to the end.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut pause = Duration::ZERO;
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, worker stopping");
                    return;
                }
                () = tokio::time::sleep(pause) => {}
            }

            pause = match self.run_once().await {
                Ok(JobOutcome::Idle) => self.poll_interval,
                Ok(_) => Duration::ZERO,
                Err(err) => {
                    tracing::error!(error = %format!("{err:#}"), "queue operation failed");
                    self.poll_interval
                }
            };
        }
    }
}

/// A job naming an unknown audience, or a run that is already terminal or
/// gone: redelivery cannot help.
fn is_unstartable(err: &PipelineError) -> bool {
    match err {
        PipelineError::UnknownAudience(_) => true,
        PipelineError::Run(source) => matches!(
            source.downcast_ref::<DbError>(),
            Some(DbError::NotFound | DbError::InvalidRunTransition { .. })
        ),
        PipelineError::StepFailure { .. } => false,
    }
}

/// Identifiers returned by [`enqueue_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueuedJob {
    pub run_id: Uuid,
    pub msg_id: i64,
}

/// Create a `pending` run and queue a job that executes it.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownAudience`] before anything is written, and
/// [`PipelineError::Run`] if the run row or queue message cannot be written.
/// A run whose message could not be sent is marked `failed`.
pub async fn enqueue_job(
    registry: &AudienceRegistry,
    store: &dyn ProspectStore,
    queue: &dyn JobQueue,
    audience_name: &str,
    location: &str,
    max_prospects: usize,
) -> Result<EnqueuedJob, PipelineError> {
    registry
        .get(audience_name)
        .map_err(|_| PipelineError::UnknownAudience(audience_name.to_owned()))?;

    let run = store
        .create_run(audience_name, location, Some(max_prospects))
        .await
        .map_err(PipelineError::Run)?;
    let job = Job {
        run_id: Some(run.public_id),
        audience_name: Some(audience_name.to_owned()),
        location: Some(location.to_owned()),
        max_prospects: Some(max_prospects),
    };
    let msg_id = match queue.enqueue(&job).await {
        Ok(msg_id) => msg_id,
        Err(err) => {
            let err = err.context(format!("queue job for run {}", run.public_id));
            if let Err(mark_err) = store.fail_run(&run, &format!("{err:#}")).await {
                tracing::error!(
                    run_id = %run.public_id,
                    error = %format!("{mark_err:#}"),
                    "failed to mark unqueued run as failed"
                );
            }
            return Err(PipelineError::Run(err));
        }
    };

    tracing::info!(run_id = %run.public_id, msg_id, "job enqueued");
    Ok(EnqueuedJob {
        run_id: run.public_id,
        msg_id,
    })
}
