//! Broadcasting of job progress for anything that wants to watch jobs live.

pub mod job_progress;

pub use job_progress::{JobProgressBroadcaster, JobProgressEvent, JobProgressTracker, JobStage};
