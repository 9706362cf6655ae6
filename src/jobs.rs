//! Background job log
//!
//! Tracks every detached pipeline run in memory. A job is recorded when
//! the webhook queues it and moves to a single terminal state when the
//! run finishes. Terminal outcomes are also emitted as structured logs so
//! they survive process restarts in the log stream.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::FormType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Completed,
    Failed { stage: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub form_type: FormType,
    pub client_hint: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: JobState,
}

/// In-memory job store shared between the webhook handler and the
/// detached pipeline tasks.
#[derive(Clone)]
pub struct JobLog {
    records: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a queued job and return its ID.
    pub async fn queued(&self, form_type: FormType, client_hint: Option<String>) -> Uuid {
        let job_id = Uuid::new_v4();
        let record = JobRecord {
            job_id,
            form_type,
            client_hint,
            queued_at: Utc::now(),
            finished_at: None,
            state: JobState::Queued,
        };
        let mut records = self.records.write().await;
        records.insert(job_id, record);
        job_id
    }

    pub async fn completed(&self, job_id: Uuid) {
        self.finish(job_id, JobState::Completed).await;
    }

    pub async fn failed(&self, job_id: Uuid, stage: &str, message: String) {
        self.finish(
            job_id,
            JobState::Failed {
                stage: stage.to_string(),
                message,
            },
        )
        .await;
    }

    async fn finish(&self, job_id: Uuid, state: JobState) {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&job_id) {
            record.finished_at = Some(Utc::now());
            record.state = state;
        }
    }

    pub async fn get(&self, job_id: Uuid) -> Option<JobRecord> {
        let records = self.records.read().await;
        records.get(&job_id).cloned()
    }
}

impl Default for JobLog {
    fn default() -> Self {
        Self::new()
    }
}
