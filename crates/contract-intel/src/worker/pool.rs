use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::error::OrchestratorError;
use crate::extract::panic_message;
use crate::worker::job::JobOutcome;
use crate::worker::orchestrator::JobRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed set of OS threads pulling job ids from a bounded queue.
///
/// Outcomes are delivered on an unbounded channel so a worker never blocks
/// on a consumer that is not reading yet.
pub struct WorkerPool {
    job_sender: Sender<String>,
    result_receiver: Receiver<JobOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// `worker_count` of 0 is treated as 1.
    pub(crate) fn new(runner: Arc<JobRunner>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<String>(worker_count * 2);
        let (result_sender, result_receiver) = unbounded::<JobOutcome>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_runner = Arc::clone(&runner);

            let handle = thread::Builder::new()
                .name(format!("assessment-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, job_rx, result_tx, shutdown_flag, worker_runner);
                });

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => error!("Failed to spawn worker {}: {}", worker_id, e),
            }
        }

        info!("Started {} workers", workers.len());

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    /// Blocks while the queue is full.
    pub fn submit(&self, job_id: String) -> Result<(), OrchestratorError> {
        if self.is_shutdown() || self.workers.is_empty() {
            return Err(OrchestratorError::Shutdown);
        }

        self.job_sender
            .send(job_id)
            .map_err(|_| OrchestratorError::Shutdown)
    }

    pub fn try_recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.recv().ok()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Workers stop after their current job; queued ids stay unprocessed.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<String>,
    result_sender: Sender<JobOutcome>,
    shutdown: Arc<AtomicBool>,
    runner: Arc<JobRunner>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(POLL_INTERVAL) {
            Ok(job_id) => {
                debug!("Worker {} processing job {}", worker_id, job_id);

                let outcome = run_guarded(worker_id, &runner, &job_id);

                if let Err(e) = result_sender.send(outcome) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Always yields an outcome, so a panic never strands the job or the
/// caller waiting on results.
fn run_guarded(worker_id: usize, runner: &JobRunner, job_id: &str) -> JobOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| runner.run(job_id))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("Worker {} could not run job {}: {}", worker_id, job_id, e);
            JobOutcome::rejected(job_id, e.to_string())
        }
        Err(payload) => {
            let reason = format!("Worker {}", panic_message(payload.as_ref()));
            error!("Worker {} aborted job {}: {}", worker_id, job_id, reason);
            if panic::catch_unwind(AssertUnwindSafe(|| runner.abandon(job_id, &reason))).is_err() {
                error!("Worker {} could not mark job {} failed", worker_id, job_id);
            }
            JobOutcome::rejected(job_id, reason)
        }
    }
}
