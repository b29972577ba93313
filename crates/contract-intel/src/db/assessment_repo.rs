//! Assessment records, stored as JSON next to their job row.

use rusqlite::params;

use super::job_repo::{self, JobRow};
use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRow {
    pub job_id: String,
    pub record_json: String,
    pub processed_at: String,
}

/// Writes the record and the job's final state in one transaction.
///
/// Returns `false` without writing anything when the job row is missing.
pub fn save_with_job(
    db: &Database,
    job: &JobRow,
    assessment: &AssessmentRow,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        if job_repo::update_on(&tx, job)? == 0 {
            return Ok(false);
        }
        tx.execute(
            "INSERT OR REPLACE INTO assessments (job_id, record_json, processed_at)
             VALUES (?1, ?2, ?3)",
            params![
                assessment.job_id,
                assessment.record_json,
                assessment.processed_at
            ],
        )?;
        tx.commit()?;
        Ok(true)
    })
}

pub fn find_by_job(db: &Database, job_id: &str) -> Result<Option<AssessmentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT job_id, record_json, processed_at FROM assessments WHERE job_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![job_id], |row| {
            Ok(AssessmentRow {
                job_id: row.get(0)?,
                record_json: row.get(1)?,
                processed_at: row.get(2)?,
            })
        })?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
