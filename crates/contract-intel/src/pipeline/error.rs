use thiserror::Error;

use crate::enhance::EnhancementError;

/// Faults that end a run with a failed job. The display string is what the
/// job's `error` field records.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document unavailable: {0}")]
    Document(#[from] crate::error::DocumentStoreError),

    #[error(transparent)]
    Extraction(#[from] crate::error::ExtractionError),

    #[error("Persistence fault: {0}")]
    Store(#[from] crate::error::StoreError),

    #[error(transparent)]
    Transition(#[from] crate::error::TransitionError),

    #[error("Stage {0}")]
    Panicked(String),
}

/// Non-fatal faults recorded on the assessment record.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    Enhancement(EnhancementError),
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::Enhancement(e) => write!(f, "Semantic enhancement skipped: {}", e),
        }
    }
}
