use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use crate::error::StoreError;
use crate::model::AssessmentRecord;
use crate::worker::job::Job;

use super::{JobFilter, JobPage, JobStore};

#[derive(Debug, Default)]
struct State {
    jobs: HashMap<String, Job>,
    records: HashMap<String, AssessmentRecord>,
}

/// Process-local store; jobs and records share one lock so
/// [`JobStore::complete`] is atomic.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    state: RwLock<State>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poisoned| {
            log::warn!("Job store lock poisoned, recovering for read");
            poisoned.into_inner()
        })
    }
}

impl JobStore for MemoryJobStore {
    fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id.clone()));
        }
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.read().jobs.get(id).cloned())
    }

    fn update(&self, job: &Job) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        match state.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(job.id.clone())),
        }
    }

    fn complete(&self, job: &Job, record: &AssessmentRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let Some(slot) = state.jobs.get_mut(&job.id) else {
            return Err(StoreError::NotFound(job.id.clone()));
        };
        *slot = job.clone();
        state.records.insert(job.id.clone(), record.clone());
        Ok(())
    }

    fn get_record(&self, job_id: &str) -> Result<Option<AssessmentRecord>, StoreError> {
        Ok(self.read().records.get(job_id).cloned())
    }

    fn list(&self, filter: &JobFilter) -> Result<JobPage, StoreError> {
        let filter = filter.normalized();
        let state = self.read();

        let mut matching: Vec<&Job> = state.jobs.values().filter(|j| filter.matches(j)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let jobs = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok(JobPage::new(jobs, total, &filter))
    }
}
