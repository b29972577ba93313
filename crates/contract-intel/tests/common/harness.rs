//! Test harness for isolated end-to-end runs.
//!
//! `TestHarness` owns a temporary directory holding the document store and
//! the SQLite database, so every test sees a fresh persistence layer that
//! behaves like the one the CLI uses.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use contract_intel::enhance::{ClassificationRequest, ClassificationResponse, EnhancementError};
use contract_intel::error::ExtractionError;
use contract_intel::{
    AssessmentRecord, Database, DocumentIntake, FilesystemDocumentStore, Job, JobFilter, JobPage,
    JobStatus, JobStore, Orchestrator, Pipeline, PlainText, SqliteJobStore, StoreError,
    TextClassifier, TextExtractor,
};

/// Test harness with on-disk stores under a temp directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub documents_dir: PathBuf,
    pub database_path: PathBuf,
    pub documents: Arc<FilesystemDocumentStore>,
    pub store: Arc<SqliteJobStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let documents_dir = temp_dir.path().join("documents");
        let database_path = temp_dir.path().join("db").join("contract-intel.db");

        let documents = Arc::new(
            FilesystemDocumentStore::new(&documents_dir).expect("Failed to create document store"),
        );
        let db = Database::open(&database_path).expect("Failed to open database");

        Self {
            temp_dir,
            documents_dir,
            database_path,
            documents,
            store: Arc::new(SqliteJobStore::new(db)),
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Pipeline over the harness stores with default stages.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.documents.clone(), self.store.clone())
    }

    /// Pipeline that reads document bytes as already-extracted text.
    pub fn text_pipeline(&self) -> Pipeline {
        self.pipeline().with_text_extractor(Arc::new(RawTextExtractor))
    }

    pub fn orchestrator(&self, pipeline: Pipeline, workers: usize) -> Orchestrator {
        Orchestrator::new(pipeline, workers)
    }

    /// Writes a file into the temp directory and returns its path.
    pub fn write_file(&self, filename: &str, content: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    /// Reopens the database file with a fresh handle.
    pub fn reopen_store(&self) -> SqliteJobStore {
        SqliteJobStore::new(Database::open(&self.database_path).expect("Failed to reopen database"))
    }
}

/// Submits every intake, waits for the pool to drain and returns the job ids.
pub fn run_all(orchestrator: &Orchestrator, intakes: Vec<DocumentIntake>) -> Vec<String> {
    let ids: Vec<String> = intakes
        .into_iter()
        .map(|intake| orchestrator.submit(intake).expect("Submission rejected"))
        .collect();
    let outcomes = orchestrator.wait_all();
    assert_eq!(outcomes.len(), ids.len(), "Not every job reported an outcome");
    ids
}

/// Polls until the job reaches `status` or the deadline passes.
pub fn wait_for_status(orchestrator: &Orchestrator, job_id: &str, status: JobStatus) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while orchestrator.status(job_id).expect("Unknown job").status != status {
        assert!(Instant::now() < deadline, "Job {} never reached {}", job_id, status);
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Treats document bytes as the text layer itself.
/// Blank input is reported the way an image-only PDF is.
pub struct RawTextExtractor;

impl TextExtractor for RawTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<PlainText, ExtractionError> {
        let text = String::from_utf8_lossy(bytes).to_string();
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyContent { pages: 1 });
        }
        Ok(PlainText::from_pages(vec![(1, text)]))
    }
}

/// Sleeps before extracting so a run stays `processing` for a while.
pub struct SlowTextExtractor(pub Duration);

impl TextExtractor for SlowTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<PlainText, ExtractionError> {
        std::thread::sleep(self.0);
        RawTextExtractor.extract(bytes)
    }
}

/// Text extractor that panics on every document.
pub struct PanickingTextExtractor;

impl TextExtractor for PanickingTextExtractor {
    fn extract(&self, _bytes: &[u8]) -> Result<PlainText, ExtractionError> {
        panic!("font program crashed");
    }
}

/// Classifier that never answers within any reasonable timeout.
pub struct StalledClassifier;

impl TextClassifier for StalledClassifier {
    fn classify(
        &self,
        _request: &ClassificationRequest,
        _timeout: Duration,
    ) -> Result<ClassificationResponse, EnhancementError> {
        std::thread::sleep(Duration::from_secs(2));
        Ok(ClassificationResponse::default())
    }
}

/// Classifier returning the same scores for every category label.
pub struct FixedClassifier(pub ClassificationResponse);

impl TextClassifier for FixedClassifier {
    fn classify(
        &self,
        _request: &ClassificationRequest,
        _timeout: Duration,
    ) -> Result<ClassificationResponse, EnhancementError> {
        Ok(self.0.clone())
    }
}

/// Job store whose `complete` always fails.
pub struct BrokenCompletionStore<S>(pub S);

impl<S: JobStore> JobStore for BrokenCompletionStore<S> {
    fn insert(&self, job: &Job) -> Result<(), StoreError> {
        self.0.insert(job)
    }
    fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        self.0.get(id)
    }
    fn update(&self, job: &Job) -> Result<(), StoreError> {
        self.0.update(job)
    }
    fn complete(&self, _job: &Job, _record: &AssessmentRecord) -> Result<(), StoreError> {
        Err(StoreError::LockPoisoned)
    }
    fn get_record(&self, job_id: &str) -> Result<Option<AssessmentRecord>, StoreError> {
        self.0.get_record(job_id)
    }
    fn list(&self, filter: &JobFilter) -> Result<JobPage, StoreError> {
        self.0.list(filter)
    }
}
