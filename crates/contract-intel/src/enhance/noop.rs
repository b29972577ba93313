use std::time::Duration;

use super::{ClassificationRequest, ClassificationResponse, EnhancementError, TextClassifier};

/// Stand-in used when no classifier is configured. Always answers with an
/// empty response, which leaves every confidence untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClassifier;

impl TextClassifier for NoopClassifier {
    fn classify(
        &self,
        _request: &ClassificationRequest,
        _timeout: Duration,
    ) -> Result<ClassificationResponse, EnhancementError> {
        Ok(ClassificationResponse::default())
    }
}
