pub mod assessment;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod enhance;
pub mod error;
pub mod extract;
pub mod intake;
pub mod model;
pub mod pipeline;
pub mod processor;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use assessment::{score, GapAnalyzer};
pub use broadcast::{JobProgressBroadcaster, JobProgressEvent, JobStage};
pub use config::{load_config, Config};
pub use db::Database;
pub use enhance::{HttpClassifier, NoopClassifier, SemanticEnhancer, TextClassifier};
pub use error::{
    ConfigError, ContractIntelError, DocumentStoreError, ExtractionError, IntakeError,
    OrchestratorError, Result, StoreError, TransitionError,
};
pub use extract::FieldExtractor;
pub use intake::DocumentIntake;
pub use model::{AssessmentRecord, Category, ExtractedData, Gap, ScoreResult};
pub use pipeline::{Pipeline, PipelineContext};
pub use processor::{PdfTextExtractor, PlainText, TextExtractor};
pub use storage::{DocumentId, DocumentStore, FilesystemDocumentStore, MemoryDocumentStore};
pub use store::{JobFilter, JobPage, JobStore, MemoryJobStore, SqliteJobStore};
pub use telemetry::init_tracing;
pub use worker::{Job, JobOutcome, JobStatus, Orchestrator};
