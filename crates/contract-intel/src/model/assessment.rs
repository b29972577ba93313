use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extracted::{Category, ExtractedData};

/// Completeness score with its per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub overall: u8,
    pub breakdown: BTreeMap<Category, u8>,
}

impl ScoreResult {
    pub fn points(&self, category: Category) -> u8 {
        self.breakdown.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criticality::High => write!(f, "high"),
            Criticality::Medium => write!(f, "medium"),
            Criticality::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub field: String,
    pub description: String,
    pub criticality: Criticality,
}

/// The persisted outcome of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub job_id: String,
    pub extracted_data: ExtractedData,
    pub score: ScoreResult,
    pub gaps: Vec<Gap>,
    /// Soft faults observed while processing (e.g. classifier timeouts).
    #[serde(default)]
    pub warnings: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl AssessmentRecord {
    pub fn high_gaps(&self) -> impl Iterator<Item = &Gap> {
        self.gaps
            .iter()
            .filter(|g| g.criticality == Criticality::High)
    }
}
