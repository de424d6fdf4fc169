//! Extraction Adapter
//!
//! Turns a raw document (or a demo token) into a [`CompanyRecord`]. Any
//! failure on the way (no provider, timeout, malformed response, response
//! with no recognised field) is recovered here by substituting the default
//! template, so extraction never fails a run.
//!
//! The same adapter serves the tasks' qualitative secondary calls through
//! [`ExtractionAdapter::extract_structured`], which does surface errors;
//! the calling task owns that recovery.

mod demo;

pub use demo::DemoProfile;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::prompts;
use deal_core::{CompanyRecord, RecordField, RecordSource};
use deal_llm::{CompletionRequest, LLMProvider, Message};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default template values, used when extraction fails
pub mod defaults {
    pub const NAME: &str = "Unnamed Startup";
    pub const INDUSTRY: &str = "Technology";
    pub const LOCATION: &str = "India";
    pub const FOUNDED_YEAR: &str = "2021";
    pub const REVENUE: &str = "₹50L";
    pub const BURN_RATE: &str = "₹8L";
    pub const RUNWAY: &str = "12 months";
    pub const FUNDING_AMOUNT: &str = "₹2Cr";
    pub const FUNDING_STAGE: &str = "Seed";
    pub const VALUATION: &str = "₹10Cr";
    pub const TEAM_SIZE: &str = "10";
    pub const GROWTH_RATE: &str = "15%";
    pub const MARKET_SIZE: &str = "₹500Cr";
}

/// The record substituted when extraction fails
pub fn default_record() -> CompanyRecord {
    CompanyRecord::new()
        .with(RecordField::Name, defaults::NAME)
        .with(RecordField::Industry, defaults::INDUSTRY)
        .with(RecordField::Location, defaults::LOCATION)
        .with(RecordField::FoundedYear, defaults::FOUNDED_YEAR)
        .with(RecordField::Revenue, defaults::REVENUE)
        .with(RecordField::BurnRate, defaults::BURN_RATE)
        .with(RecordField::Runway, defaults::RUNWAY)
        .with(RecordField::FundingAmount, defaults::FUNDING_AMOUNT)
        .with(RecordField::FundingStage, defaults::FUNDING_STAGE)
        .with(RecordField::Valuation, defaults::VALUATION)
        .with(RecordField::TeamSize, defaults::TEAM_SIZE)
        .with(RecordField::GrowthRate, defaults::GROWTH_RATE)
        .with(RecordField::MarketSize, defaults::MARKET_SIZE)
}

/// What an analysis run starts from
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisInput {
    /// Raw document text
    Document(String),
    /// Canned demo profile
    Demo(DemoProfile),
}

impl AnalysisInput {
    pub fn document(text: impl Into<String>) -> Self {
        Self::Document(text.into())
    }
}

impl From<DemoProfile> for AnalysisInput {
    fn from(profile: DemoProfile) -> Self {
        Self::Demo(profile)
    }
}

/// Tagged extraction result
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Parsed from the provider response
    Extracted(CompanyRecord),
    /// Canned demo record
    Demo {
        profile: DemoProfile,
        record: CompanyRecord,
    },
    /// Default template substituted after a failure
    Defaulted {
        record: CompanyRecord,
        reason: String,
    },
}

impl Extraction {
    pub fn record(&self) -> &CompanyRecord {
        match self {
            Self::Extracted(record)
            | Self::Demo { record, .. }
            | Self::Defaulted { record, .. } => record,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }

    /// Split into the record and its provenance
    pub fn into_parts(self) -> (CompanyRecord, RecordSource) {
        match self {
            Self::Extracted(record) => (record, RecordSource::Extracted),
            Self::Demo { profile, record } => (
                record,
                RecordSource::Demo {
                    profile: profile.name().to_string(),
                },
            ),
            Self::Defaulted { record, reason } => (record, RecordSource::Defaulted { reason }),
        }
    }
}

/// Outermost `{...}` span of a response, skipping code fences and prose
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Prefix of `text` holding at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Adapter over an optional generative-text provider
#[derive(Clone)]
pub struct ExtractionAdapter {
    provider: Option<Arc<dyn LLMProvider>>,
    config: Arc<EngineConfig>,
}

impl std::fmt::Debug for ExtractionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionAdapter")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("model", &self.config.model)
            .finish()
    }
}

impl ExtractionAdapter {
    /// Adapter backed by a provider
    pub fn new(provider: Arc<dyn LLMProvider>, config: Arc<EngineConfig>) -> Self {
        Self {
            provider: Some(provider),
            config,
        }
    }

    /// Adapter without a provider; every document falls back to the default template
    pub fn offline(config: Arc<EngineConfig>) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    pub fn is_online(&self) -> bool {
        self.provider.is_some()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce the run's company record; never fails
    #[instrument(skip_all, fields(online = self.is_online()))]
    pub async fn extract(&self, input: &AnalysisInput) -> Extraction {
        match input {
            AnalysisInput::Demo(profile) => {
                info!(profile = %profile, "Using demo profile");
                Extraction::Demo {
                    profile: *profile,
                    record: profile.record(),
                }
            }
            AnalysisInput::Document(text) => match self.extract_document(text).await {
                Ok(record) => {
                    info!(fields = record.populated(), "Extraction complete");
                    Extraction::Extracted(record)
                }
                Err(err) => {
                    warn!(error = %err, "Extraction failed, using default template");
                    Extraction::Defaulted {
                        record: default_record(),
                        reason: err.to_string(),
                    }
                }
            },
        }
    }

    async fn extract_document(&self, text: &str) -> Result<CompanyRecord> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Extraction("document is empty".to_string()));
        }

        let document = truncate_chars(text, self.config.max_document_chars);
        if document.len() < text.len() {
            debug!(
                max_chars = self.config.max_document_chars,
                "Document truncated for extraction"
            );
        }

        let fields: Vec<&str> = RecordField::ALL.iter().map(RecordField::key).collect();
        let prompt = prompts::render(
            prompts::EXTRACTION_USER,
            json!({ "fields": fields, "document": document }),
        )?;

        let object = self.complete_json(prompts::EXTRACTION_SYSTEM, prompt).await?;
        let record = CompanyRecord::from_map(&object);
        if record.is_empty() {
            return Err(EngineError::Extraction(
                "response contains no recognised field".to_string(),
            ));
        }
        Ok(record)
    }

    /// One structured generative call returning a JSON object
    ///
    /// Unlike [`ExtractionAdapter::extract`] this surfaces failures; callers
    /// must treat any error or shape deviation as recoverable.
    pub async fn extract_structured(&self, prompt: impl Into<String>) -> Result<Map<String, Value>> {
        self.complete_json(prompts::QUALITATIVE_SYSTEM, prompt.into())
            .await
    }

    async fn complete_json(&self, system: &str, prompt: String) -> Result<Map<String, Value>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(EngineError::ProviderUnavailable)?;

        let request = CompletionRequest::builder(&self.config.model)
            .system(system)
            .add_message(Message::user(prompt))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .json_output()
            .build();

        let budget = self.config.llm_timeout;
        let response = tokio::time::timeout(budget, provider.complete(request))
            .await
            .map_err(|_| EngineError::Timeout(budget))??;

        debug!(
            provider = provider.name(),
            output_tokens = response.usage.output_tokens,
            "Structured response received"
        );
        if response.is_truncated() {
            warn!("Structured response hit the token limit");
        }

        let json = locate_json_object(&response.text).ok_or_else(|| {
            EngineError::Extraction("response contains no JSON object".to_string())
        })?;

        match serde_json::from_str::<Value>(json)? {
            Value::Object(object) => Ok(object),
            other => Err(EngineError::Extraction(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProvider, failing_provider, scripted_provider};
    use deal_llm::{CompletionResponse, LLMError};
    use std::time::Duration;

    fn adapter(provider: MockProvider) -> ExtractionAdapter {
        ExtractionAdapter::new(Arc::new(provider), Arc::new(EngineConfig::default()))
    }

    #[test]
    fn test_locate_json_object() {
        let fenced = "```json\n{\"name\": \"Acme\"}\n```";
        assert_eq!(locate_json_object(fenced), Some("{\"name\": \"Acme\"}"));
        assert_eq!(
            locate_json_object("Here you go: {\"a\": {\"b\": 1}} thanks"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(locate_json_object("no json"), None);
        assert_eq!(locate_json_object("} backwards {"), None);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("₹₹₹₹", 2), "₹₹");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_default_record_is_complete() {
        let record = default_record();
        assert_eq!(record.populated(), RecordField::ALL.len());
        assert_eq!(record.display_name(), defaults::NAME);
    }

    #[tokio::test]
    async fn test_extract_fenced_response() {
        let provider = scripted_provider(
            "```json\n{\"companyName\": \"KrishiLink\", \"revenue\": \"₹14L\", \"team_size\": 12, \"growthRate\": null}\n```",
        );
        let extraction = adapter(provider)
            .extract(&AnalysisInput::document("KrishiLink pitch deck"))
            .await;

        let Extraction::Extracted(record) = extraction else {
            panic!("expected extracted record, got {extraction:?}");
        };
        assert_eq!(record.display_name(), "KrishiLink");
        assert_eq!(record.amount(RecordField::Revenue), Some(1.4e6));
        assert_eq!(record.get(RecordField::TeamSize), Some("12"));
        assert!(!record.has(RecordField::GrowthRate));
    }

    #[tokio::test]
    async fn test_extract_keeps_record_with_duplicate_spellings() {
        let provider = scripted_provider(
            "{\"name\": \"Acme\", \"fundingStage\": \"Seed\", \"stage\": \"Seed\", \"growthRate\": \"25%\", \"growth\": \"30%\", \"revenue\": \"₹14L\"}",
        );
        let extraction = adapter(provider)
            .extract(&AnalysisInput::document("Acme pitch deck"))
            .await;

        let Extraction::Extracted(record) = extraction else {
            panic!("expected extracted record, got {extraction:?}");
        };
        assert_eq!(record.display_name(), "Acme");
        assert_eq!(record.get(RecordField::FundingStage), Some("Seed"));
        assert_eq!(record.percent(RecordField::GrowthRate), Some(25.0));
        assert_eq!(record.amount(RecordField::Revenue), Some(1.4e6));
    }

    #[tokio::test]
    async fn test_extract_malformed_response_defaults() {
        let extraction = adapter(scripted_provider("I could not find any data."))
            .extract(&AnalysisInput::document("deck"))
            .await;
        assert!(extraction.is_defaulted());
        assert_eq!(extraction.record(), &default_record());
    }

    #[tokio::test]
    async fn test_extract_unrecognised_keys_defaults() {
        let extraction = adapter(scripted_provider("{\"ceo\": \"A. Person\"}"))
            .extract(&AnalysisInput::document("deck"))
            .await;
        let (_, source) = extraction.into_parts();
        assert!(matches!(
            source,
            RecordSource::Defaulted { ref reason } if reason.contains("no recognised field")
        ));
    }

    #[tokio::test]
    async fn test_extract_invalid_json_defaults() {
        let extraction = adapter(scripted_provider("{name: Acme, revenue: ??}"))
            .extract(&AnalysisInput::document("deck"))
            .await;
        assert!(extraction.is_defaulted());
    }

    #[tokio::test]
    async fn test_extract_provider_error_defaults() {
        let provider = failing_provider(|| LLMError::RateLimitExceeded("slow down".to_string()));
        let extraction = adapter(provider)
            .extract(&AnalysisInput::document("deck"))
            .await;
        assert!(extraction.is_defaulted());
    }

    #[tokio::test]
    async fn test_empty_document_skips_provider() {
        let mut provider = MockProvider::new();
        provider.expect_complete().never();
        provider.expect_name().return_const("mock".to_string());

        let extraction = adapter(provider)
            .extract(&AnalysisInput::document("   \n"))
            .await;
        assert!(extraction.is_defaulted());
    }

    #[tokio::test]
    async fn test_offline_defaults() {
        let adapter = ExtractionAdapter::offline(Arc::new(EngineConfig::default()));
        let extraction = adapter.extract(&AnalysisInput::document("deck")).await;
        assert!(matches!(
            extraction,
            Extraction::Defaulted { ref reason, .. } if reason.contains("No generative-text provider")
        ));

        let err = adapter.extract_structured("anything").await.unwrap_err();
        assert!(matches!(err, EngineError::ProviderUnavailable));
    }

    #[tokio::test]
    async fn test_demo_skips_provider() {
        let mut provider = MockProvider::new();
        provider.expect_complete().never();
        provider.expect_name().return_const("mock".to_string());

        let extraction = adapter(provider)
            .extract(&AnalysisInput::Demo(DemoProfile::Fintech))
            .await;
        let (record, source) = extraction.into_parts();
        assert_eq!(record.display_name(), "PayVeda");
        assert_eq!(
            source,
            RecordSource::Demo {
                profile: "fintech".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_request_carries_config_and_truncated_document() {
        let config = EngineConfig::builder()
            .model("test-model")
            .max_document_chars(5)
            .build()
            .unwrap();

        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .withf(|request| {
                request.model == "test-model"
                    && request.json_output
                    && request.messages[0].content.contains("\"\"\"\nabcde\n\"\"\"")
            })
            .times(1)
            .returning(|_| Ok(CompletionResponse::text("{\"name\": \"Acme\"}")));
        provider.expect_name().return_const("mock".to_string());

        let adapter = ExtractionAdapter::new(Arc::new(provider), Arc::new(config));
        let extraction = adapter
            .extract(&AnalysisInput::document("abcdefghij"))
            .await;
        assert!(matches!(extraction, Extraction::Extracted(_)));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        struct SlowProvider;

        #[async_trait::async_trait]
        impl LLMProvider for SlowProvider {
            async fn complete(
                &self,
                _request: CompletionRequest,
            ) -> deal_llm::Result<CompletionResponse> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(CompletionResponse::text("{\"name\": \"Late\"}"))
            }

            fn name(&self) -> &str {
                "slow"
            }
        }

        let config = EngineConfig::builder()
            .llm_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let adapter = ExtractionAdapter::new(Arc::new(SlowProvider), Arc::new(config));

        let err = adapter.extract_structured("prompt").await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }
}
