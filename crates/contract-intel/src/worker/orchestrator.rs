//! Job intake, dispatch and the read surface over jobs and records.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{info, info_span, warn};

use crate::broadcast::{JobProgressBroadcaster, JobProgressEvent};
use crate::config::Config;
use crate::error::{ConfigError, OrchestratorError};
use crate::intake::{DocumentIntake, DEFAULT_MAX_FILE_SIZE};
use crate::model::{AssessmentRecord, Gap};
use crate::pipeline::{BroadcastProgress, NoopProgress, Pipeline};
use crate::storage::DocumentStore;
use crate::store::{JobFilter, JobPage, JobStore};
use crate::worker::job::{Job, JobOutcome, JobStatus};
use crate::worker::pool::WorkerPool;

/// Runs jobs by id while guaranteeing at most one active run per id.
pub(crate) struct JobRunner {
    pipeline: Pipeline,
    claims: Mutex<HashSet<String>>,
    progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
}

/// Releases a claimed job id when dropped.
struct Claim<'a> {
    claims: &'a Mutex<HashSet<String>>,
    job_id: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        lock_claims(self.claims).remove(&self.job_id);
    }
}

fn lock_claims(claims: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    claims.lock().unwrap_or_else(|poisoned| {
        warn!("Job claim set lock poisoned, recovering");
        poisoned.into_inner()
    })
}

impl JobRunner {
    pub(crate) fn new(
        pipeline: Pipeline,
        progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
    ) -> Self {
        Self {
            pipeline,
            claims: Mutex::new(HashSet::new()),
            progress_sender,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn JobStore> {
        self.pipeline.store()
    }

    pub(crate) fn documents(&self) -> &Arc<dyn DocumentStore> {
        self.pipeline.documents()
    }

    fn try_claim(&self, job_id: &str) -> Option<Claim<'_>> {
        if !lock_claims(&self.claims).insert(job_id.to_string()) {
            return None;
        }
        Some(Claim {
            claims: &self.claims,
            job_id: job_id.to_string(),
        })
    }

    /// Runs a pending job to a terminal state.
    ///
    /// Rejected with [`OrchestratorError::ReentryRejected`] when another run
    /// holds the job or the job already left `pending`.
    pub(crate) fn run(&self, job_id: &str) -> Result<JobOutcome, OrchestratorError> {
        let seen = self
            .store()
            .get(job_id)?
            .ok_or_else(|| OrchestratorError::UnknownJob(job_id.to_string()))?;

        let Some(_claim) = self.try_claim(job_id) else {
            return Err(OrchestratorError::ReentryRejected {
                job_id: job_id.to_string(),
                status: seen.status,
            });
        };

        // Re-read under the claim; another run may have finished meanwhile.
        let job = self
            .store()
            .get(job_id)?
            .ok_or_else(|| OrchestratorError::UnknownJob(job_id.to_string()))?;
        if job.status != JobStatus::Pending {
            return Err(OrchestratorError::ReentryRejected {
                job_id: job_id.to_string(),
                status: job.status,
            });
        }

        let outcome = match &self.progress_sender {
            Some(sender) => {
                let progress =
                    BroadcastProgress::new(&job.id, job.filename.as_deref(), Arc::clone(sender));
                self.pipeline.run(job, &progress).0
            }
            None => self.pipeline.run(job, &NoopProgress).0,
        };
        Ok(outcome)
    }

    /// Marks a job that will never run as failed. Terminal jobs are left
    /// alone; store faults are only logged.
    pub(crate) fn abandon(&self, job_id: &str, reason: &str) {
        let mut job = match self.store().get(job_id) {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(e) => {
                warn!(job_id, "Cannot load abandoned job: {}", e);
                return;
            }
        };
        if job.is_terminal() {
            return;
        }
        if let Err(e) = job.fail(reason) {
            warn!(job_id, "Cannot fail abandoned job: {}", e);
            return;
        }
        match self.store().update(&job) {
            Ok(()) => {
                if let Some(sender) = &self.progress_sender {
                    let _ = sender.send(JobProgressEvent::failed(
                        &job.id,
                        job.filename.as_deref(),
                        job.progress,
                        reason,
                    ));
                }
            }
            Err(e) => warn!(job_id, "Cannot persist abandoned job: {}", e),
        }
    }
}

/// Entry point for submitting documents and reading results.
pub struct Orchestrator {
    runner: Arc<JobRunner>,
    pool: WorkerPool,
    broadcaster: JobProgressBroadcaster,
    max_file_size: u64,
    outstanding: AtomicUsize,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline, worker_count: usize) -> Self {
        let broadcaster = JobProgressBroadcaster::default();
        let runner = Arc::new(JobRunner::new(pipeline, Some(broadcaster.sender())));
        let pool = WorkerPool::new(Arc::clone(&runner), worker_count);

        Self {
            runner,
            pool,
            broadcaster,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            outstanding: AtomicUsize::new(0),
        }
    }

    pub fn from_config(
        config: &Config,
        documents: Arc<dyn DocumentStore>,
        store: Arc<dyn JobStore>,
    ) -> Result<Self, ConfigError> {
        let pipeline = Pipeline::from_config(config, documents, store)?;
        Ok(Self::new(pipeline, config.workers.count)
            .with_max_file_size(config.intake.max_file_size_bytes))
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn broadcaster(&self) -> &JobProgressBroadcaster {
        &self.broadcaster
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.broadcaster.subscribe()
    }

    /// Validates and stores the document, creates a pending job and queues
    /// it. Returns the new job id; intake violations create no job.
    pub fn submit(&self, intake: DocumentIntake) -> Result<String, OrchestratorError> {
        let _span = info_span!("submit", filename = intake.filename.as_deref().unwrap_or("unknown"))
            .entered();

        intake.validate(self.max_file_size)?;

        let document_id = self.runner.documents().put(&intake.bytes)?;
        let job = Job::new(document_id, intake.filename);
        self.runner.store().insert(&job)?;
        self.broadcaster.start_job(&job.id, job.filename.as_deref());

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.pool.submit(job.id.clone()) {
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
            // Never queued; leave no pending job behind.
            self.runner.abandon(&job.id, &e.to_string());
            return Err(e);
        }

        info!(job_id = %job.id, "Job submitted");
        Ok(job.id)
    }

    /// Runs a job on the calling thread, subject to the same single-run
    /// guarantee as the worker pool.
    pub fn process(&self, job_id: &str) -> Result<JobOutcome, OrchestratorError> {
        self.runner.run(job_id)
    }

    pub fn status(&self, job_id: &str) -> Result<Job, OrchestratorError> {
        self.runner
            .store()
            .get(job_id)?
            .ok_or_else(|| OrchestratorError::UnknownJob(job_id.to_string()))
    }

    /// `None` until the job has completed.
    pub fn record(&self, job_id: &str) -> Result<Option<AssessmentRecord>, OrchestratorError> {
        self.status(job_id)?;
        Ok(self.runner.store().get_record(job_id)?)
    }

    pub fn gaps(&self, job_id: &str) -> Result<Option<Vec<Gap>>, OrchestratorError> {
        Ok(self.record(job_id)?.map(|record| record.gaps))
    }

    pub fn list(&self, filter: &JobFilter) -> Result<JobPage, OrchestratorError> {
        Ok(self.runner.store().list(filter)?)
    }

    /// Blocks until every submitted job has produced an outcome and returns
    /// the outcomes in completion order.
    pub fn wait_all(&self) -> Vec<JobOutcome> {
        let mut outcomes = Vec::new();
        while self.outstanding.load(Ordering::SeqCst) > 0 {
            match self.pool.recv_result() {
                Some(outcome) => {
                    self.outstanding.fetch_sub(1, Ordering::SeqCst);
                    outcomes.push(outcome);
                }
                None => break,
            }
        }
        outcomes
    }

    /// Stops the workers after their current job and joins them.
    pub fn shutdown(self) {
        self.pool.shutdown();
        self.pool.wait();
    }
}
