use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, warn};

use crate::assessment::{self, GapAnalyzer};
use crate::broadcast::JobStage;
use crate::config::Config;
use crate::enhance::{HttpClassifier, NoopClassifier, SemanticEnhancer, TextClassifier};
use crate::error::{ConfigError, TransitionError};
use crate::extract::{panic_message, FieldExtractor};
use crate::model::{AssessmentRecord, ExtractedData, Gap, ScoreResult};
use crate::processor::{PdfTextExtractor, PlainText, TextExtractor};
use crate::storage::DocumentStore;
use crate::store::JobStore;
use crate::worker::job::{Job, JobOutcome, JobStatus};

use super::context::PipelineContext;
use super::error::{PipelineError, PipelineWarning};
use super::progress::{ProgressEvent, ProgressReporter};

/// Job progress recorded after each stage.
pub mod checkpoints {
    pub const TEXT_EXTRACTED: u8 = 20;
    pub const FIELDS_EXTRACTED: u8 = 50;
    pub const ENHANCED: u8 = 70;
    pub const SCORED: u8 = 90;
    pub const PERSISTED: u8 = 100;
}

/// Runs one job from `pending` to a terminal state: text extraction, field
/// extraction, semantic enhancement, scoring, gap analysis and persistence.
pub struct Pipeline {
    text_extractor: Arc<dyn TextExtractor>,
    field_extractor: FieldExtractor,
    enhancer: SemanticEnhancer,
    gap_analyzer: GapAnalyzer,
    documents: Arc<dyn DocumentStore>,
    store: Arc<dyn JobStore>,
}

impl Pipeline {
    /// PDF extraction, the built-in extractor registry, default gap threshold
    /// and no classifier.
    pub fn new(documents: Arc<dyn DocumentStore>, store: Arc<dyn JobStore>) -> Self {
        Self {
            text_extractor: Arc::new(PdfTextExtractor::new()),
            field_extractor: FieldExtractor::new(),
            enhancer: SemanticEnhancer::new(Arc::new(NoopClassifier)),
            gap_analyzer: GapAnalyzer::default(),
            documents,
            store,
        }
    }

    /// Production constructor. Wires the HTTP classifier when the enhancer
    /// is enabled.
    pub fn from_config(
        config: &Config,
        documents: Arc<dyn DocumentStore>,
        store: Arc<dyn JobStore>,
    ) -> Result<Self, ConfigError> {
        let settings = &config.enhancer;
        let classifier: Arc<dyn TextClassifier> = match (&settings.endpoint, settings.enabled) {
            (Some(endpoint), true) => {
                let classifier = HttpClassifier::new(endpoint.clone(), settings.api_key()?)
                    .map_err(|e| ConfigError::Validation {
                        message: format!("Cannot build classifier client: {}", e),
                    })?;
                Arc::new(classifier)
            }
            _ => Arc::new(NoopClassifier),
        };

        let enhancer = SemanticEnhancer::new(classifier)
            .with_timeout(settings.timeout())
            .with_snippet_chars(settings.snippet_chars);

        Ok(Self::new(documents, store)
            .with_enhancer(enhancer)
            .with_gap_analyzer(GapAnalyzer::new(config.assessment.min_confidence)))
    }

    pub fn with_text_extractor(mut self, text_extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = text_extractor;
        self
    }

    pub fn with_field_extractor(mut self, field_extractor: FieldExtractor) -> Self {
        self.field_extractor = field_extractor;
        self
    }

    pub fn with_enhancer(mut self, enhancer: SemanticEnhancer) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn with_gap_analyzer(mut self, gap_analyzer: GapAnalyzer) -> Self {
        self.gap_analyzer = gap_analyzer;
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    /// Run the full pipeline for a single pending job.
    ///
    /// Never panics on bad input and never leaves the job `processing`:
    /// the outcome is `completed` with the record persisted, or `failed`
    /// with a reason. A job that is not pending is returned untouched.
    pub fn run(&self, job: Job, progress: &dyn ProgressReporter) -> (JobOutcome, PipelineContext) {
        let _pipeline_span = info_span!("pipeline",
            job_id = %job.id,
            filename = job.filename.as_deref().unwrap_or("unknown"),
        )
        .entered();

        let mut ctx = PipelineContext::new(job);

        if ctx.job.status != JobStatus::Pending {
            let rejection = TransitionError::NotPending {
                job_id: ctx.job.id.clone(),
                status: ctx.job.status,
            };
            warn!("{}", rejection);
            return (JobOutcome::rejected(&ctx.job.id, rejection.to_string()), ctx);
        }

        // A panicking stage fails the job like any other fault.
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&mut ctx, progress)))
            .unwrap_or_else(|payload| {
                Err(PipelineError::Panicked(panic_message(payload.as_ref())))
            });

        match result {
            Ok(()) => {
                let overall = ctx.job.overall_score.unwrap_or(0);
                info!(
                    score = overall,
                    gaps = ctx.gaps.len(),
                    warnings = ctx.warnings.len(),
                    "Assessment completed"
                );
                progress.report(ProgressEvent::Completed {
                    overall_score: overall,
                    gap_count: ctx.gaps.len(),
                });
            }
            Err(e) => self.fail(&mut ctx, &e, progress),
        }

        (JobOutcome::from_job(&ctx.job), ctx)
    }

    fn execute(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        // Step 0: Claim
        ctx.job.begin()?;
        self.store.update(&ctx.job)?;
        progress.report(ProgressEvent::Stage {
            stage: JobStage::ExtractingText,
            progress: 0,
            message: "Extracting text...".to_string(),
        });

        // Step 1: Extract text
        let plain = {
            let _step = info_span!("extract_text").entered();
            self.step_extract_text(&ctx.job)?
        };
        ctx.plain_text = Some(plain.clone());
        self.checkpoint(
            ctx,
            progress,
            JobStage::ExtractingText,
            checkpoints::TEXT_EXTRACTED,
            format!("Extracted text from {} page(s)", plain.page_count()),
        )?;

        // Step 2: Extract fields
        let extracted = {
            let _step = info_span!("extract_fields").entered();
            self.field_extractor.extract_fields(&plain.text)
        };
        ctx.extracted = Some(extracted.clone());
        self.checkpoint(
            ctx,
            progress,
            JobStage::ExtractingFields,
            checkpoints::FIELDS_EXTRACTED,
            "Fields extracted".to_string(),
        )?;

        // Step 3: Enhance
        let extracted = {
            let _step = info_span!("enhance").entered();
            self.step_enhance(ctx, &plain.text, extracted)
        };
        self.checkpoint(
            ctx,
            progress,
            JobStage::Enhancing,
            checkpoints::ENHANCED,
            "Enhancement attempted".to_string(),
        )?;

        // Step 4: Score
        let score = {
            let _step = info_span!("score").entered();
            assessment::score(&extracted)
        };
        ctx.score = Some(score.clone());
        self.checkpoint(
            ctx,
            progress,
            JobStage::Scoring,
            checkpoints::SCORED,
            format!("Scored {}/100", score.overall),
        )?;

        // Step 5: Gaps
        let gaps = {
            let _step = info_span!("analyze_gaps").entered();
            self.gap_analyzer.analyze(&extracted)
        };
        ctx.gaps = gaps.clone();

        // Step 6: Persist record and completed job together
        {
            let _step = info_span!("persist").entered();
            self.step_persist(ctx, extracted, score, gaps)?;
        }

        Ok(())
    }

    fn step_extract_text(&self, job: &Job) -> Result<PlainText, PipelineError> {
        let bytes = self.documents.fetch(&job.document_id)?;
        let plain = self.text_extractor.extract(&bytes)?;
        debug!(pages = plain.page_count(), chars = plain.text.len(), "Text extracted");
        Ok(plain)
    }

    fn step_enhance(&self, ctx: &mut PipelineContext, text: &str, data: ExtractedData) -> ExtractedData {
        let (enhanced, fault) = self.enhancer.enhance(text, &data);
        if let Some(e) = fault {
            ctx.warnings.push(PipelineWarning::Enhancement(e));
        }
        ctx.extracted = Some(enhanced.clone());
        enhanced
    }

    fn step_persist(
        &self,
        ctx: &mut PipelineContext,
        extracted: ExtractedData,
        score: ScoreResult,
        gaps: Vec<Gap>,
    ) -> Result<(), PipelineError> {
        let mut completed = ctx.job.clone();
        completed.complete(score.overall)?;

        let record = AssessmentRecord {
            job_id: completed.id.clone(),
            extracted_data: extracted,
            score,
            gaps,
            warnings: ctx.warnings.iter().map(ToString::to_string).collect(),
            processed_at: Utc::now(),
        };

        self.store.complete(&completed, &record)?;
        ctx.job = completed;
        Ok(())
    }

    fn checkpoint(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
        stage: JobStage,
        value: u8,
        message: String,
    ) -> Result<(), PipelineError> {
        ctx.job.advance(value)?;
        self.store.update(&ctx.job)?;
        progress.report(ProgressEvent::Stage {
            stage,
            progress: value,
            message,
        });
        Ok(())
    }

    fn fail(&self, ctx: &mut PipelineContext, e: &PipelineError, progress: &dyn ProgressReporter) {
        let reason = e.to_string();
        warn!(error = %reason, "Assessment failed");

        if let Err(transition) = ctx.job.fail(reason.clone()) {
            error!("Cannot mark job failed: {}", transition);
            return;
        }
        if let Err(store_err) = self.store.update(&ctx.job) {
            error!("Failed to persist failed job state: {}", store_err);
        }

        progress.report(ProgressEvent::Failed {
            progress: ctx.job.progress,
            error: reason,
        });
    }
}
