pub mod job;
pub mod orchestrator;
pub mod pool;

pub use job::{Job, JobOutcome, JobStatus};
pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
