//! Background job state machine
//!
//! A job moves queued → running → {completed | failed}. Transitions are
//! monotonic: a terminal job never changes again and a queued job cannot be
//! finished without first running.

use chrono::{DateTime, Utc};
use sentiprep_common::time;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Clean,
    Label,
    Train,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Clean => "clean",
            JobKind::Label => "label",
            JobKind::Train => "train",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "clean" => Some(JobKind::Clean),
            "label" => Some(JobKind::Label),
            "train" => Some(JobKind::Train),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn can_become(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("Job {job_id} cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Persisted job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub dataset_id: Uuid,
    pub session_id: Uuid,
    /// Set for training jobs
    pub model_id: Option<Uuid>,
    /// Labeling method or training algorithm
    pub method: Option<String>,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    pub message: String,
    pub result_file: Option<String>,
    /// Stage summary: cleaning metrics, labeling summary or training metrics
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(kind: JobKind, dataset_id: Uuid, session_id: Uuid) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            kind,
            dataset_id,
            session_id,
            model_id: None,
            method: None,
            status: JobStatus::Queued,
            progress: 0,
            message: String::new(),
            result_file: None,
            result: None,
            created_at: time::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_model_id(mut self, model_id: Uuid) -> Self {
        self.model_id = Some(model_id);
        self
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), JobError> {
        if !self.status.can_become(to) {
            return Err(JobError::InvalidTransition {
                job_id: self.job_id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        if to.is_terminal() {
            self.finished_at = Some(time::now());
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(time::now());
        self.progress = self.progress.max(1);
        self.message = "Started".to_string();
        Ok(())
    }

    /// Update progress of a running job; progress never moves backwards
    pub fn set_progress(&mut self, progress: u8, message: impl Into<String>) -> Result<(), JobError> {
        if self.status != JobStatus::Running {
            return Err(JobError::InvalidTransition {
                job_id: self.job_id,
                from: self.status,
                to: JobStatus::Running,
            });
        }
        self.progress = progress.min(100).max(self.progress);
        self.message = message.into();
        Ok(())
    }

    pub fn complete(&mut self, result_file: Option<String>, message: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Completed)?;
        self.progress = 100;
        self.result_file = result_file;
        self.message = message.into();
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Failed)?;
        self.message = message.into();
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
