use crate::model::{ExtractedData, Gap, ScoreResult};
use crate::processor::PlainText;
use crate::worker::job::Job;

use super::error::PipelineWarning;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Step 1 result
    pub plain_text: Option<PlainText>,

    // Step 2 result, replaced by step 3 when enhancement succeeds
    pub extracted: Option<ExtractedData>,

    // Step 4 result
    pub score: Option<ScoreResult>,

    // Step 5 result
    pub gaps: Vec<Gap>,

    // Non-fatal warnings
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            plain_text: None,
            extracted: None,
            score: None,
            gaps: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
