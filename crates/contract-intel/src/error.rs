use std::path::PathBuf;
use thiserror::Error;

use crate::worker::job::JobStatus;

#[derive(Error, Debug)]
pub enum ContractIntelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Intake rejected: {0}")]
    Intake(#[from] IntakeError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("Document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Logging setup failed: {0}")]
    Telemetry(String),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Environment variable '{name}' not set")]
    MissingSecret { name: String },
}

/// Rejections raised before a job exists.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid media type '{0}'")]
    InvalidMediaType(String),

    #[error("Unsupported media type '{0}', only application/pdf is accepted")]
    UnsupportedMediaType(String),

    #[error("Document is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to read document '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal text extraction failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("Empty content: no extractable text found in {pages} page(s)")]
    EmptyContent { pages: usize },
}

#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document store IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document store lock poisoned")]
    LockPoisoned,
}

/// Persistence faults from the job/result store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to serialize assessment record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt job row '{id}': {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Job store lock poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Document(#[from] DocumentStoreError),

    #[error("Job {job_id} is already {status}; submit a new job to reprocess")]
    ReentryRejected { job_id: String, status: JobStatus },

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Worker pool is shut down")]
    Shutdown,
}

/// Lifecycle violations rejected by [`crate::worker::Job`] itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Job {job_id} cannot start from status {status}")]
    NotPending { job_id: String, status: JobStatus },

    #[error("Job {job_id} is {status} and can no longer change")]
    Terminal { job_id: String, status: JobStatus },

    #[error("Job {job_id} is not processing (status {status})")]
    NotProcessing { job_id: String, status: JobStatus },

    #[error("Job {job_id} progress cannot move from {from} to {to}")]
    ProgressRegression { job_id: String, from: u8, to: u8 },

    #[error("Progress {0} is out of range 0-100")]
    ProgressOutOfRange(u8),
}

pub type Result<T> = std::result::Result<T, ContractIntelError>;
