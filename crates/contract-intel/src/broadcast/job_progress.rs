//! Job progress broadcaster for real-time job status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::worker::job::JobStatus;

/// Pipeline stage a progress event refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    ExtractingText,
    ExtractingFields,
    Enhancing,
    Scoring,
    AnalyzingGaps,
    Completed,
    Failed,
}

impl JobStage {
    pub fn status(&self) -> JobStatus {
        match self {
            JobStage::Queued => JobStatus::Pending,
            JobStage::Completed => JobStatus::Completed,
            JobStage::Failed => JobStatus::Failed,
            _ => JobStatus::Processing,
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStage::Queued => write!(f, "Queued"),
            JobStage::ExtractingText => write!(f, "Extracting text"),
            JobStage::ExtractingFields => write!(f, "Extracting fields"),
            JobStage::Enhancing => write!(f, "Enhancing"),
            JobStage::Scoring => write!(f, "Scoring"),
            JobStage::AnalyzingGaps => write!(f, "Analyzing gaps"),
            JobStage::Completed => write!(f, "Completed"),
            JobStage::Failed => write!(f, "Failed"),
        }
    }
}

/// Progress event for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub stage: JobStage,
    pub status: JobStatus,
    /// Checkpoint reached, 0-100.
    pub progress: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Set on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    /// Set on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_count: Option<usize>,
    /// Set on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    pub fn new(
        job_id: &str,
        filename: Option<&str>,
        stage: JobStage,
        progress: u8,
        message: &str,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            filename: filename.map(str::to_string),
            stage,
            status: stage.status(),
            progress,
            message: message.to_string(),
            timestamp: Utc::now(),
            overall_score: None,
            gap_count: None,
            error: None,
        }
    }

    pub fn completed(job_id: &str, filename: Option<&str>, overall_score: u8, gap_count: usize) -> Self {
        Self {
            overall_score: Some(overall_score),
            gap_count: Some(gap_count),
            ..Self::new(
                job_id,
                filename,
                JobStage::Completed,
                100,
                "Assessment completed",
            )
        }
    }

    pub fn failed(job_id: &str, filename: Option<&str>, progress: u8, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(job_id, filename, JobStage::Failed, progress, "Assessment failed")
        }
    }
}

/// Fan-out of [`JobProgressEvent`]s. Sending never fails; events without
/// subscribers are dropped.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: JobProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }

    /// Tracker for one job; announces it as queued.
    pub fn start_job(&self, job_id: &str, filename: Option<&str>) -> JobProgressTracker {
        let tracker = JobProgressTracker::new(job_id, filename, Arc::clone(&self.sender));
        tracker.update_stage(JobStage::Queued, 0, "Job queued for assessment");
        tracker
    }

    pub fn sender(&self) -> Arc<broadcast::Sender<JobProgressEvent>> {
        Arc::clone(&self.sender)
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl std::fmt::Debug for JobProgressBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobProgressBroadcaster")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

/// Tracks progress for a single job.
pub struct JobProgressTracker {
    job_id: String,
    filename: Option<String>,
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressTracker {
    pub fn new(
        job_id: &str,
        filename: Option<&str>,
        sender: Arc<broadcast::Sender<JobProgressEvent>>,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            filename: filename.map(str::to_string),
            sender,
        }
    }

    pub fn update_stage(&self, stage: JobStage, progress: u8, message: &str) {
        let event = JobProgressEvent::new(
            &self.job_id,
            self.filename.as_deref(),
            stage,
            progress,
            message,
        );
        let _ = self.sender.send(event);
    }

    pub fn completed(&self, overall_score: u8, gap_count: usize) {
        let event = JobProgressEvent::completed(
            &self.job_id,
            self.filename.as_deref(),
            overall_score,
            gap_count,
        );
        let _ = self.sender.send(event);
    }

    pub fn failed(&self, progress: u8, error: &str) {
        let event =
            JobProgressEvent::failed(&self.job_id, self.filename.as_deref(), progress, error);
        let _ = self.sender.send(event);
    }
}
