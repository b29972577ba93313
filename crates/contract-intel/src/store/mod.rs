//! Job and assessment persistence behind the [`JobStore`] trait.

use serde::Serialize;

use crate::error::StoreError;
use crate::model::AssessmentRecord;
use crate::worker::job::{Job, JobStatus};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryJobStore;
pub use sqlite::SqliteJobStore;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Listing filter. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub min_score: Option<u8>,
    pub page: u32,
    pub limit: u32,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            status: None,
            min_score: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl JobFilter {
    /// Page clamped to at least 1, limit to `1..=MAX_PAGE_LIMIT`.
    pub fn normalized(&self) -> Self {
        Self {
            status: self.status,
            min_score: self.min_score,
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        let f = self.normalized();
        u64::from(f.page - 1) * u64::from(f.limit)
    }

    pub fn matches(&self, job: &Job) -> bool {
        if self.status.is_some_and(|s| s != job.status) {
            return false;
        }
        match self.min_score {
            Some(min) => job.overall_score.is_some_and(|score| score >= min),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl JobPage {
    pub fn new(jobs: Vec<Job>, total: u64, filter: &JobFilter) -> Self {
        let filter = filter.normalized();
        let pages = total.div_ceil(u64::from(filter.limit));
        Self {
            jobs,
            total,
            page: filter.page,
            limit: filter.limit,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

/// Durable home of jobs and their assessment records.
///
/// Implementations must make [`JobStore::complete`] atomic: either both the
/// record and the completed job are visible afterwards, or neither is.
pub trait JobStore: Send + Sync {
    /// Fails with [`StoreError::AlreadyExists`] for a duplicate id.
    fn insert(&self, job: &Job) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Overwrites an existing job; [`StoreError::NotFound`] otherwise.
    fn update(&self, job: &Job) -> Result<(), StoreError>;

    fn complete(&self, job: &Job, record: &AssessmentRecord) -> Result<(), StoreError>;

    fn get_record(&self, job_id: &str) -> Result<Option<AssessmentRecord>, StoreError>;

    /// Jobs matching `filter`, newest first.
    fn list(&self, filter: &JobFilter) -> Result<JobPage, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DocumentId;

    #[test]
    fn test_filter_normalization() {
        let f = JobFilter {
            page: 0,
            limit: 1000,
            ..Default::default()
        }
        .normalized();
        assert_eq!(f.page, 1);
        assert_eq!(f.limit, MAX_PAGE_LIMIT);

        let f = JobFilter {
            page: 3,
            limit: 0,
            ..Default::default()
        };
        assert_eq!(f.normalized().limit, 1);
        assert_eq!(f.offset(), 2);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = JobPage::new(Vec::new(), 21, &JobFilter::default());
        assert_eq!(page.pages, 3);
        assert_eq!(JobPage::new(Vec::new(), 0, &JobFilter::default()).pages, 0);
    }

    #[test]
    fn test_min_score_excludes_unscored_jobs() {
        let mut job = Job::new(DocumentId::from("d"), None);
        let filter = JobFilter {
            min_score: Some(0),
            ..Default::default()
        };
        assert!(!filter.matches(&job));

        job.begin().unwrap();
        job.complete(0).unwrap();
        assert!(filter.matches(&job));
    }
}
