//! Row mapping and queries for the `jobs` table.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub document_id: String,
    pub filename: Option<String>,
    pub status: String,
    pub progress: i64,
    pub error: Option<String>,
    pub overall_score: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            filename: row.get("filename")?,
            status: row.get("status")?,
            progress: row.get("progress")?,
            error: row.get("error")?,
            overall_score: row.get("overall_score")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobRowFilter {
    pub status: Option<String>,
    pub min_score: Option<i64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, document_id, filename, status, progress, error,
             overall_score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id,
                job.document_id,
                job.filename,
                job.status,
                job.progress,
                job.error,
                job.overall_score,
                job.created_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Overwrites every mutable column. Returns the number of rows touched,
/// so `0` means the job does not exist.
pub fn update(db: &Database, job: &JobRow) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| update_on(conn, job))
}

/// Same as [`update`] on a connection the caller already holds, for use
/// inside a transaction.
pub(crate) fn update_on(conn: &Connection, job: &JobRow) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET document_id=?2, filename=?3, status=?4, progress=?5, error=?6,
         overall_score=?7, updated_at=?8
         WHERE id=?1",
        params![
            job.id,
            job.document_id,
            job.filename,
            job.status,
            job.progress,
            job.error,
            job.overall_score,
            job.updated_at,
        ],
    )?;
    Ok(changed)
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries jobs with filters, newest first, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobRowFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(min_score) = filter.min_score {
            conditions.push(format!(
                "overall_score IS NOT NULL AND overall_score >= ?{}",
                param_values.len() + 1
            ));
            param_values.push(Box::new(min_score));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC, id ASC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}
