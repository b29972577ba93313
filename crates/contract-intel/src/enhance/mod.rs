//! Optional confidence refinement through an external text classifier.
//!
//! The enhancer never fails a job: any classifier fault leaves the record
//! exactly as it was and is surfaced as an [`EnhancementError`] for the
//! caller to log and record as a warning.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use regex::RegexBuilder;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::extract::{clamp_confidence, parties};
use crate::model::{Category, ExtractedData, Party};

pub mod http;
pub mod noop;

pub use http::HttpClassifier;
pub use noop::NoopClassifier;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SNIPPET_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnhancementError {
    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("Classifier transport error: {0}")]
    Transport(String),

    #[error("Classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Classifier quota exhausted: {0}")]
    Quota(String),

    #[error("Malformed classifier response: {0}")]
    Malformed(String),

    #[error("Classifier worker exited without a response")]
    Disconnected,
}

/// Text snippet plus the labels the classifier should score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRequest {
    pub text: String,
    pub candidate_labels: Vec<String>,
}

/// Label relevance scores in `[0, 1]` and any party names the classifier
/// recognised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResponse {
    pub scores: BTreeMap<String, f64>,
    pub candidate_parties: Vec<String>,
}

/// External classification capability.
///
/// `timeout` is advisory for implementations; [`SemanticEnhancer`] enforces
/// it regardless.
pub trait TextClassifier: Send + Sync {
    fn classify(
        &self,
        request: &ClassificationRequest,
        timeout: Duration,
    ) -> Result<ClassificationResponse, EnhancementError>;
}

/// Classifier label sent for each category.
pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Financial => "financial terms and contract value",
        Category::Parties => "contracting parties",
        Category::Payment => "payment terms",
        Category::Revenue => "recurring revenue",
        Category::Sla => "service level agreement",
        Category::Contact => "contact information",
    }
}

/// Blends classifier scores into category confidences.
///
/// For a category with confidence `c > 0` and classifier score `s` the new
/// confidence is `max(c, (c + s) / 2)`, so enhancement never lowers a
/// confidence and never lifts a category that has no content.
#[derive(Clone)]
pub struct SemanticEnhancer {
    classifier: Arc<dyn TextClassifier>,
    timeout: Duration,
    snippet_chars: usize,
}

impl std::fmt::Debug for SemanticEnhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticEnhancer")
            .field("timeout", &self.timeout)
            .field("snippet_chars", &self.snippet_chars)
            .finish_non_exhaustive()
    }
}

impl SemanticEnhancer {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            classifier,
            timeout: DEFAULT_TIMEOUT,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the refined record, or the fault that prevented refinement.
    pub fn try_enhance(
        &self,
        text: &str,
        data: &ExtractedData,
    ) -> Result<ExtractedData, EnhancementError> {
        let _span = info_span!("enhance", timeout_ms = self.timeout.as_millis() as u64).entered();

        let request = ClassificationRequest {
            text: text.chars().take(self.snippet_chars).collect(),
            candidate_labels: Category::ALL
                .iter()
                .map(|c| category_label(*c).to_string())
                .collect(),
        };

        let response = self.classify_bounded(request)?;
        validate(&response)?;

        let mut enhanced = data.clone();
        for category in Category::ALL {
            let current = data.confidence(category);
            if current <= 0.0 {
                continue;
            }
            if let Some(score) = response.scores.get(category_label(category)) {
                let blended = clamp_confidence(f64::max(current, (current + score) / 2.0));
                enhanced.confidence_scores.insert(category, blended);
            }
        }

        let added = merge_candidate_parties(&mut enhanced, text, &response.candidate_parties);
        if added > 0 {
            let recomputed = parties::confidence_for(&enhanced.parties);
            let kept = f64::max(enhanced.confidence(Category::Parties), recomputed);
            enhanced
                .confidence_scores
                .insert(Category::Parties, clamp_confidence(kept));
        }

        debug!(added_parties = added, "Enhancement applied");
        Ok(enhanced)
    }

    /// Soft-fault wrapper: on any error the input comes back unchanged
    /// together with the error.
    pub fn enhance(
        &self,
        text: &str,
        data: &ExtractedData,
    ) -> (ExtractedData, Option<EnhancementError>) {
        match self.try_enhance(text, data) {
            Ok(enhanced) => (enhanced, None),
            Err(e) => {
                warn!("Semantic enhancement skipped: {}", e);
                (data.clone(), Some(e))
            }
        }
    }

    /// Runs the classifier on a helper thread and waits at most `timeout`.
    /// A classifier that overruns is abandoned; its thread finishes on its
    /// own and the late answer is dropped.
    fn classify_bounded(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationResponse, EnhancementError> {
        let (tx, rx) = bounded(1);
        let classifier = Arc::clone(&self.classifier);
        let timeout = self.timeout;

        thread::Builder::new()
            .name("classifier-call".to_string())
            .spawn(move || {
                let _ = tx.send(classifier.classify(&request, timeout));
            })
            .map_err(|e| EnhancementError::Transport(format!("failed to spawn classifier thread: {}", e)))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EnhancementError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(EnhancementError::Disconnected),
        }
    }
}

fn validate(response: &ClassificationResponse) -> Result<(), EnhancementError> {
    for (label, score) in &response.scores {
        if !score.is_finite() || !(0.0..=1.0).contains(score) {
            return Err(EnhancementError::Malformed(format!(
                "score {} for '{}' is outside [0, 1]",
                score, label
            )));
        }
    }
    Ok(())
}

/// Lower-case words allowed inside a multi-word name.
const NAME_CONNECTORS: &[&str] = &["&", "and", "of", "the", "de", "du", "van", "von"];

/// Appends candidates that occur in `text` as a whole, capitalized name and
/// are not already known. The name is recorded as the document spells it.
fn merge_candidate_parties(data: &mut ExtractedData, text: &str, candidates: &[String]) -> usize {
    let mut added = 0;
    for candidate in candidates {
        let Some(name) = find_name(text, candidate.trim()) else {
            continue;
        };
        if data.has_party(name) {
            continue;
        }
        data.parties.push(Party::named(name));
        added += 1;
    }
    added
}

/// First case-insensitive, word-bounded occurrence of `candidate` in `text`
/// that reads as a proper name.
fn find_name<'a>(text: &'a str, candidate: &str) -> Option<&'a str> {
    if candidate.is_empty() {
        return None;
    }
    let pattern = RegexBuilder::new(&regex::escape(candidate))
        .case_insensitive(true)
        .build()
        .ok()?;
    let found = pattern
        .find_iter(text)
        .filter(|m| word_bounded(text, m.start(), m.end()))
        .map(|m| m.as_str())
        .find(|name| looks_like_name(name));
    found
}

fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

fn looks_like_name(name: &str) -> bool {
    let capitalized =
        |word: &str| word.chars().next().is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
    let mut words = name.split_whitespace();
    words.next().is_some_and(capitalized)
        && words.all(|word| capitalized(word) || NAME_CONNECTORS.contains(&word))
}
