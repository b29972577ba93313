pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use context::PipelineContext;
pub use error::{PipelineError, PipelineWarning};
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::{checkpoints, Pipeline};
