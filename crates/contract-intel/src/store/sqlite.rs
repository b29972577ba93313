use chrono::{DateTime, Utc};

use crate::db::assessment_repo::{self, AssessmentRow};
use crate::db::job_repo::{self, JobRow, JobRowFilter};
use crate::db::Database;
use crate::error::StoreError;
use crate::model::AssessmentRecord;
use crate::storage::DocumentId;
use crate::worker::job::{Job, JobStatus};

use super::{JobFilter, JobPage, JobStore};

/// [`JobStore`] on the shared SQLite [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteJobStore {
    db: Database,
}

impl SqliteJobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn to_row(job: &Job) -> JobRow {
    JobRow {
        id: job.id.clone(),
        document_id: job.document_id.to_string(),
        filename: job.filename.clone(),
        status: job.status.as_str().to_string(),
        progress: i64::from(job.progress),
        error: job.error.clone(),
        overall_score: job.overall_score.map(i64::from),
        created_at: job.created_at.to_rfc3339(),
        updated_at: job.updated_at.to_rfc3339(),
    }
}

fn corrupt(id: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn parse_timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(id, format!("bad timestamp '{}': {}", raw, e)))
}

fn from_row(row: JobRow) -> Result<Job, StoreError> {
    let status: JobStatus = row.status.parse().map_err(|e: String| corrupt(&row.id, e))?;
    let progress = u8::try_from(row.progress)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| corrupt(&row.id, format!("progress {} out of range", row.progress)))?;
    let overall_score = row
        .overall_score
        .map(|s| {
            u8::try_from(s)
                .ok()
                .filter(|s| *s <= 100)
                .ok_or_else(|| corrupt(&row.id, format!("score {} out of range", s)))
        })
        .transpose()?;

    Ok(Job {
        created_at: parse_timestamp(&row.id, &row.created_at)?,
        updated_at: parse_timestamp(&row.id, &row.updated_at)?,
        document_id: DocumentId::from(row.document_id),
        filename: row.filename,
        status,
        progress,
        error: row.error,
        overall_score,
        id: row.id,
    })
}

impl JobStore for SqliteJobStore {
    fn insert(&self, job: &Job) -> Result<(), StoreError> {
        if job_repo::find_by_id(&self.db, &job.id)?.is_some() {
            return Err(StoreError::AlreadyExists(job.id.clone()));
        }
        job_repo::insert(&self.db, &to_row(job))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        job_repo::find_by_id(&self.db, id)?.map(from_row).transpose()
    }

    fn update(&self, job: &Job) -> Result<(), StoreError> {
        match job_repo::update(&self.db, &to_row(job))? {
            0 => Err(StoreError::NotFound(job.id.clone())),
            _ => Ok(()),
        }
    }

    fn complete(&self, job: &Job, record: &AssessmentRecord) -> Result<(), StoreError> {
        let row = AssessmentRow {
            job_id: job.id.clone(),
            record_json: serde_json::to_string(record)?,
            processed_at: record.processed_at.to_rfc3339(),
        };
        if !assessment_repo::save_with_job(&self.db, &to_row(job), &row)? {
            return Err(StoreError::NotFound(job.id.clone()));
        }
        Ok(())
    }

    fn get_record(&self, job_id: &str) -> Result<Option<AssessmentRecord>, StoreError> {
        assessment_repo::find_by_job(&self.db, job_id)?
            .map(|row| serde_json::from_str(&row.record_json).map_err(StoreError::from))
            .transpose()
    }

    fn list(&self, filter: &JobFilter) -> Result<JobPage, StoreError> {
        let filter = filter.normalized();
        let (rows, total) = job_repo::query(
            &self.db,
            &JobRowFilter {
                status: filter.status.map(|s| s.as_str().to_string()),
                min_score: filter.min_score.map(i64::from),
                limit: Some(u64::from(filter.limit)),
                offset: Some(filter.offset()),
            },
        )?;
        let jobs = rows.into_iter().map(from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(JobPage::new(jobs, total, &filter))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;

    use super::*;
    use crate::model::{Category, ExtractedData, ScoreResult};

    fn store() -> SqliteJobStore {
        SqliteJobStore::new(Database::open_in_memory().unwrap())
    }

    fn job() -> Job {
        Job::new(DocumentId::from("doc-1"), Some("msa.pdf".to_string()))
    }

    fn record_for(job: &Job, overall: u8) -> AssessmentRecord {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(Category::Parties, overall);
        AssessmentRecord {
            job_id: job.id.clone(),
            extracted_data: ExtractedData::default(),
            score: ScoreResult { overall, breakdown },
            gaps: Vec::new(),
            warnings: vec!["enhancer timed out".to_string()],
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_round_trips_through_rows() {
        let store = store();
        let mut job = job();
        store.insert(&job).unwrap();
        job.begin().unwrap();
        job.advance(50).unwrap();
        store.update(&job).unwrap();

        let loaded = store.get(&job.id).unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Processing);
        assert_eq!(loaded.progress, 50);
        assert_eq!(loaded.filename.as_deref(), Some("msa.pdf"));
        assert_eq!(loaded.created_at, job.created_at);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let store = store();
        let job = job();
        store.insert(&job).unwrap();
        assert!(matches!(store.insert(&job), Err(StoreError::AlreadyExists(_))));
        assert!(matches!(
            store.update(&Job::new(DocumentId::from("x"), None)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_complete_persists_record_json() {
        let store = store();
        let mut job = job();
        store.insert(&job).unwrap();
        job.begin().unwrap();
        job.complete(25).unwrap();
        let record = record_for(&job, 25);

        store.complete(&job, &record).unwrap();

        assert_eq!(store.get_record(&job.id).unwrap(), Some(record));
        assert_eq!(store.get(&job.id).unwrap().unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_complete_unknown_job_is_not_found() {
        let store = store();
        let job = job();
        let result = store.complete(&job, &record_for(&job, 0));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.get_record(&job.id).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_status_is_reported() {
        let store = store();
        let job = job();
        store.insert(&job).unwrap();
        store
            .database()
            .with_conn(|conn| {
                conn.execute("UPDATE jobs SET status = 'exploded'", [])?;
                Ok(())
            })
            .unwrap();

        assert!(matches!(store.get(&job.id), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_list_with_filters() {
        let store = store();
        let base = Utc::now();
        for (i, score) in [Some(95), Some(40), None].into_iter().enumerate() {
            let mut job = job();
            job.created_at = base + Duration::seconds(i as i64);
            store.insert(&job).unwrap();
            job.begin().unwrap();
            match score {
                Some(s) => {
                    job.complete(s).unwrap();
                    store.complete(&job, &record_for(&job, s)).unwrap();
                }
                None => {
                    job.fail("Empty content").unwrap();
                    store.update(&job).unwrap();
                }
            }
        }

        let all = store.list(&JobFilter::default()).unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.jobs[0].status, JobStatus::Failed);

        let strong = store
            .list(&JobFilter {
                min_score: Some(90),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(strong.total, 1);
        assert_eq!(strong.jobs[0].overall_score, Some(95));

        let failed = store
            .list(&JobFilter {
                status: Some(JobStatus::Failed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(failed.jobs.len(), 1);
        assert_eq!(failed.jobs[0].error.as_deref(), Some("Empty content"));
    }
}
