use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::storage::DocumentId;

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// One processing attempt for one stored document.
///
/// All state changes go through [`Job::begin`], [`Job::advance`],
/// [`Job::complete`] and [`Job::fail`], which reject transitions the
/// lifecycle `pending → processing → completed | failed` does not allow.
/// Fields are readable; mutate only through those methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub document_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(document_id: DocumentId, filename: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id,
            filename,
            status: JobStatus::Pending,
            progress: 0,
            error: None,
            overall_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `pending → processing`, progress reset to 0.
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        if self.status != JobStatus::Pending {
            return Err(TransitionError::NotPending {
                job_id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = JobStatus::Processing;
        self.progress = 0;
        self.touch();
        Ok(())
    }

    /// Moves progress forward. Equal values are accepted, lower ones are not.
    pub fn advance(&mut self, progress: u8) -> Result<(), TransitionError> {
        self.ensure_processing()?;
        if progress > 100 {
            return Err(TransitionError::ProgressOutOfRange(progress));
        }
        if progress < self.progress {
            return Err(TransitionError::ProgressRegression {
                job_id: self.id.clone(),
                from: self.progress,
                to: progress,
            });
        }
        self.progress = progress;
        self.touch();
        Ok(())
    }

    /// `processing → completed` with the final score; progress becomes 100.
    pub fn complete(&mut self, overall_score: u8) -> Result<(), TransitionError> {
        self.ensure_processing()?;
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.overall_score = Some(overall_score.min(100));
        self.touch();
        Ok(())
    }

    /// Marks a non-terminal job failed. A blank reason is replaced so a
    /// failed job never carries an empty error.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal {
                job_id: self.id.clone(),
                status: self.status,
            });
        }
        let reason = reason.into();
        self.error = Some(if reason.trim().is_empty() {
            "unknown failure".to_string()
        } else {
            reason
        });
        self.status = JobStatus::Failed;
        self.touch();
        Ok(())
    }

    fn ensure_processing(&self) -> Result<(), TransitionError> {
        match self.status {
            JobStatus::Processing => Ok(()),
            status if status.is_terminal() => Err(TransitionError::Terminal {
                job_id: self.id.clone(),
                status,
            }),
            status => Err(TransitionError::NotProcessing {
                job_id: self.id.clone(),
                status,
            }),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// What a worker reports back after running a job to a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    pub overall_score: Option<u8>,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            overall_score: job.overall_score,
            error: job.error.clone(),
        }
    }

    pub fn rejected(job_id: &str, error: String) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            overall_score: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
