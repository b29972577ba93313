use std::sync::Arc;

use tokio::sync::broadcast;

use crate::broadcast::job_progress::{JobProgressEvent, JobProgressTracker, JobStage};

/// Events emitted by the pipeline during processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Stage {
        stage: JobStage,
        progress: u8,
        message: String,
    },
    Completed {
        overall_score: u8,
        gap_count: usize,
    },
    Failed {
        progress: u8,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events to the broadcast channel.
pub struct BroadcastProgress {
    tracker: JobProgressTracker,
}

impl BroadcastProgress {
    pub fn new(
        job_id: &str,
        filename: Option<&str>,
        sender: Arc<broadcast::Sender<JobProgressEvent>>,
    ) -> Self {
        Self {
            tracker: JobProgressTracker::new(job_id, filename, sender),
        }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Stage {
                stage,
                progress,
                message,
            } => self.tracker.update_stage(stage, progress, &message),
            ProgressEvent::Completed {
                overall_score,
                gap_count,
            } => self.tracker.completed(overall_score, gap_count),
            ProgressEvent::Failed { progress, error } => self.tracker.failed(progress, &error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::JobProgressBroadcaster;
    use crate::worker::job::JobStatus;

    #[test]
    fn test_broadcast_progress_forwards_events() {
        let broadcaster = JobProgressBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();
        let progress = BroadcastProgress::new("job-1", Some("msa.pdf"), broadcaster.sender());

        progress.report(ProgressEvent::Stage {
            stage: JobStage::Scoring,
            progress: 90,
            message: "Scored".to_string(),
        });
        progress.report(ProgressEvent::Completed {
            overall_score: 95,
            gap_count: 0,
        });

        let stage = rx.try_recv().unwrap();
        assert_eq!(stage.stage, JobStage::Scoring);
        assert_eq!(stage.filename.as_deref(), Some("msa.pdf"));
        let done = rx.try_recv().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.overall_score, Some(95));
    }
}
