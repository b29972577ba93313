use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ClassificationRequest, ClassificationResponse, EnhancementError, TextClassifier};

/// Longest response body quoted back in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Zero-shot classification endpoint speaking the Hugging Face inference
/// format: `{"inputs": .., "parameters": {"candidate_labels": [..]}}` in,
/// parallel `labels` / `scores` arrays out.
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for HttpClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClassifier")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
    #[serde(default)]
    candidate_parties: Vec<String>,
}

impl HttpClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Result<Self, EnhancementError> {
        let client = Client::builder()
            .user_agent(concat!("contract-intel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnhancementError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Uses a caller-configured client (proxies, TLS roots).
    pub fn with_client(client: Client, endpoint: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextClassifier for HttpClassifier {
    fn classify(
        &self,
        request: &ClassificationRequest,
        timeout: Duration,
    ) -> Result<ClassificationResponse, EnhancementError> {
        let body = json!({
            "inputs": request.text,
            "parameters": {
                "candidate_labels": request.candidate_labels,
                "multi_label": true,
            },
        });

        let mut builder = self.client.post(&self.endpoint).timeout(timeout).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                EnhancementError::Timeout(timeout)
            } else {
                EnhancementError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| EnhancementError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = text.len(), "Classifier responded");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EnhancementError::Quota(truncate(&text)));
        }
        if !status.is_success() {
            return Err(EnhancementError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        parse_response(&text)
    }
}

fn parse_response(body: &str) -> Result<ClassificationResponse, EnhancementError> {
    let parsed: ZeroShotResponse =
        serde_json::from_str(body).map_err(|e| EnhancementError::Malformed(e.to_string()))?;

    if parsed.labels.len() != parsed.scores.len() {
        return Err(EnhancementError::Malformed(format!(
            "{} labels but {} scores",
            parsed.labels.len(),
            parsed.scores.len()
        )));
    }

    let scores: BTreeMap<String, f64> = parsed.labels.into_iter().zip(parsed.scores).collect();
    Ok(ClassificationResponse {
        scores,
        candidate_parties: parsed.candidate_parties,
    })
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}
