//! Configuration for analysis runs

use crate::error::{EngineError, Result};
use crate::tasks::CONFIDENCE_FLOOR;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the analysis engine
///
/// The fallback confidence and qualitative penalty are uncalibrated
/// defaults; they live here so they can be tuned without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model name passed to the provider
    pub model: String,

    /// Max tokens per generative call
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Time budget for a single generative call
    pub llm_timeout: Duration,

    /// Maximum document characters sent to extraction
    pub max_document_chars: usize,

    /// Confidence reported by a fallback outcome
    pub fallback_confidence: f64,

    /// Confidence deducted when a task's qualitative payload is defaulted
    pub qualitative_penalty: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
            llm_timeout: Duration::from_secs(30),
            max_document_chars: 12_000,
            fallback_confidence: 60.0,
            qualitative_penalty: 5.0,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Overlay values from environment variables
    ///
    /// Reads `DEALSCOPE_MODEL`, `DEALSCOPE_LLM_TIMEOUT_SECS` and
    /// `DEALSCOPE_FALLBACK_CONFIDENCE`.
    pub fn with_env(self) -> Result<Self> {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(model) = lookup("DEALSCOPE_MODEL") {
            self.model = model;
        }
        if let Some(secs) = lookup("DEALSCOPE_LLM_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                EngineError::Config(format!("DEALSCOPE_LLM_TIMEOUT_SECS: {e}"))
            })?;
            self.llm_timeout = Duration::from_secs(secs);
        }
        if let Some(confidence) = lookup("DEALSCOPE_FALLBACK_CONFIDENCE") {
            self.fallback_confidence = confidence.trim().parse::<f64>().map_err(|e| {
                EngineError::Config(format!("DEALSCOPE_FALLBACK_CONFIDENCE: {e}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(EngineError::Config("model must not be empty".to_string()));
        }

        if self.max_tokens == 0 {
            return Err(EngineError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm_timeout.is_zero() {
            return Err(EngineError::Config(
                "llm_timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_document_chars == 0 {
            return Err(EngineError::Config(
                "max_document_chars must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.fallback_confidence) {
            return Err(EngineError::Config(
                "fallback_confidence must be within [0, 100]".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.qualitative_penalty) {
            return Err(EngineError::Config(
                "qualitative_penalty must be within [0, 100]".to_string(),
            ));
        }

        // A fallback must report less confidence than any completed analysis.
        let lowest_normal = CONFIDENCE_FLOOR - self.qualitative_penalty;
        if self.fallback_confidence >= lowest_normal {
            return Err(EngineError::Config(format!(
                "fallback_confidence must be below {lowest_normal}, the lowest confidence of a completed analysis"
            )));
        }

        Ok(())
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    llm_timeout: Option<Duration>,
    max_document_chars: Option<usize>,
    fallback_confidence: Option<f64>,
    qualitative_penalty: Option<f64>,
}

impl EngineConfigBuilder {
    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens per call
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the per-call time budget
    pub fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    /// Set the document character budget
    pub fn max_document_chars(mut self, chars: usize) -> Self {
        self.max_document_chars = Some(chars);
        self
    }

    /// Set the fallback confidence
    pub fn fallback_confidence(mut self, confidence: f64) -> Self {
        self.fallback_confidence = Some(confidence);
        self
    }

    /// Set the qualitative penalty
    pub fn qualitative_penalty(mut self, penalty: f64) -> Self {
        self.qualitative_penalty = Some(penalty);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            max_document_chars: self
                .max_document_chars
                .unwrap_or(defaults.max_document_chars),
            fallback_confidence: self
                .fallback_confidence
                .unwrap_or(defaults.fallback_confidence),
            qualitative_penalty: self
                .qualitative_penalty
                .unwrap_or(defaults.qualitative_penalty),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.fallback_confidence, 60.0);
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .model("gpt-4o-mini")
            .llm_timeout(Duration::from_secs(5))
            .fallback_confidence(50.0)
            .build()
            .unwrap();

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.llm_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_confidence, 50.0);
        assert_eq!(config.max_document_chars, 12_000);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(EngineConfig::builder().fallback_confidence(120.0).build().is_err());
        assert!(EngineConfig::builder().max_tokens(0).build().is_err());
        assert!(
            EngineConfig::builder()
                .llm_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(EngineConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn test_fallback_confidence_stays_below_completed_analyses() {
        assert!(EngineConfig::builder().fallback_confidence(90.0).build().is_err());
        assert!(EngineConfig::builder().fallback_confidence(61.0).build().is_err());
        assert!(EngineConfig::builder().fallback_confidence(60.9).build().is_ok());
        assert!(
            EngineConfig::builder()
                .qualitative_penalty(20.0)
                .fallback_confidence(50.0)
                .build()
                .is_err()
        );

        let result = EngineConfig::default()
            .with_lookup(|k| (k == "DEALSCOPE_FALLBACK_CONFIDENCE").then(|| "75".to_string()));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DEALSCOPE_MODEL", "local-model"),
            ("DEALSCOPE_LLM_TIMEOUT_SECS", "12"),
        ]);
        let config = EngineConfig::default()
            .with_lookup(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.model, "local-model");
        assert_eq!(config.llm_timeout, Duration::from_secs(12));
        assert_eq!(config.fallback_confidence, 60.0);
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let result = EngineConfig::default()
            .with_lookup(|k| (k == "DEALSCOPE_LLM_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
