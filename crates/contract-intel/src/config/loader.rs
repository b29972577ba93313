use std::path::Path;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Checks the schema cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.workers.count == 0 {
        return Err(ConfigError::Validation {
            message: "workers.count must be at least 1".to_string(),
        });
    }

    let min = config.assessment.min_confidence;
    if !min.is_finite() || !(0.0..=1.0).contains(&min) {
        return Err(ConfigError::Validation {
            message: format!("assessment.min_confidence {} is outside [0, 1]", min),
        });
    }

    let enhancer = &config.enhancer;
    if enhancer.enabled && enhancer.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
        return Err(ConfigError::Validation {
            message: "enhancer.endpoint is required when the enhancer is enabled".to_string(),
        });
    }
    if enhancer.timeout_ms == 0 || enhancer.snippet_chars == 0 {
        return Err(ConfigError::Validation {
            message: "enhancer.timeout_ms and enhancer.snippet_chars must be positive".to_string(),
        });
    }

    Ok(())
}
