//! Job messages and the queue seam the worker consumes.

use async_trait::async_trait;
use prospector_core::AppConfig;
use prospector_db::PgQueue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::{RunRequest, RunTarget};

/// Queue payload. Every field is optional; gaps are filled from
/// [`JobDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Public id of a `pending` run created by the enqueuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_prospects: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefaults {
    pub audience_name: String,
    pub location: String,
    pub max_prospects: usize,
}

impl JobDefaults {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            audience_name: config.default_audience.clone(),
            location: config.default_location.clone(),
            max_prospects: config.default_max_prospects,
        }
    }
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            audience_name: "local_business".to_owned(),
            location: "San Francisco".to_owned(),
            max_prospects: 5,
        }
    }
}

impl Job {
    /// Resolve into a workflow request. Blank strings and a zero cap count
    /// as missing.
    #[must_use]
    pub fn into_request(self, defaults: &JobDefaults) -> RunRequest {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        RunRequest {
            audience_name: non_blank(self.audience_name)
                .unwrap_or_else(|| defaults.audience_name.clone()),
            location: non_blank(self.location).unwrap_or_else(|| defaults.location.clone()),
            max_prospects: self
                .max_prospects
                .filter(|m| *m > 0)
                .unwrap_or(defaults.max_prospects),
            target: self.run_id.map_or(RunTarget::New, RunTarget::Existing),
        }
    }
}

/// A message read from the queue, hidden from other readers until its
/// visibility timeout lapses.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub msg_id: i64,
    /// Deliveries so far, including this one.
    pub read_count: i32,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn receive(&self, visibility_timeout_secs: i32) -> anyhow::Result<Option<QueuedJob>>;

    /// Deletes the message. Returns `false` if it was already gone.
    async fn ack(&self, msg_id: i64) -> anyhow::Result<bool>;

    async fn enqueue(&self, job: &Job) -> anyhow::Result<i64>;
}

#[async_trait]
impl JobQueue for PgQueue {
    async fn receive(&self, visibility_timeout_secs: i32) -> anyhow::Result<Option<QueuedJob>> {
        let message =
            prospector_db::read_message(self.pool(), self.queue_name(), visibility_timeout_secs)
                .await?;
        Ok(message.map(|m| QueuedJob {
            msg_id: m.msg_id,
            read_count: m.read_ct,
            payload: m.message,
        }))
    }

    async fn ack(&self, msg_id: i64) -> anyhow::Result<bool> {
        Ok(prospector_db::delete_message(self.pool(), self.queue_name(), msg_id).await?)
    }

    async fn enqueue(&self, job: &Job) -> anyhow::Result<i64> {
        let payload = serde_json::to_value(job)?;
        Ok(prospector_db::send_message(self.pool(), self.queue_name(), &payload).await?)
    }
}
