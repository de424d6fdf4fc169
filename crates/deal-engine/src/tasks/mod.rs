//! Analysis tasks
//!
//! All four tasks share one control flow, [`ScoringTask`], parameterised by a
//! [`ScoringStrategy`] that owns the domain arithmetic. The task handles the
//! optional qualitative call, confidence, status and the fallback path.

mod competitive;
mod market;
mod portfolio;
mod risk;

pub use competitive::CompetitiveStrategy;
pub use market::MarketStrategy;
pub use portfolio::PortfolioStrategy;
pub use risk::RiskStrategy;

use crate::error::{EngineError, Result};
use crate::extraction::ExtractionAdapter;
use crate::prompts;
use crate::reference::ReferenceData;
use async_trait::async_trait;
use deal_core::{
    AnalysisOutcome, AnalysisTask, CompanyRecord, Insight, OutcomeStatus, RecordField, TaskKind,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Confidence of a task whose inputs are all missing
pub const CONFIDENCE_FLOOR: f64 = 66.0;

/// Confidence gained from fully populated inputs
pub const CONFIDENCE_SPAN: f64 = 30.0;

/// Maximum entries kept per qualitative key
pub const MAX_QUALITATIVE_ITEMS: usize = 4;

/// Qualitative sub-fields a strategy wants from a secondary call
#[derive(Debug, Clone, Copy)]
pub struct QualitativeRequest {
    pub instruction: &'static str,
    pub keys: &'static [&'static str],
}

/// Qualitative payload handed to a strategy
///
/// Every requested key is present: either generated or defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Qualitative {
    values: BTreeMap<String, Vec<String>>,
    defaulted: Vec<String>,
}

impl Qualitative {
    /// Values for `key`; empty when never requested
    pub fn get(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether any key fell back to its default
    pub fn is_defaulted(&self) -> bool {
        !self.defaulted.is_empty()
    }

    pub fn defaulted_keys(&self) -> &[String] {
        &self.defaulted
    }

    /// Every key defaulted
    fn defaults(request: &QualitativeRequest, default: impl Fn(&str) -> Vec<String>) -> Self {
        Self::from_object(request, &Map::new(), default)
    }

    /// Coerce a response object; missing or empty keys fall back per key
    fn from_object(
        request: &QualitativeRequest,
        object: &Map<String, Value>,
        default: impl Fn(&str) -> Vec<String>,
    ) -> Self {
        let mut qualitative = Self::default();
        for key in request.keys {
            let items = object.get(*key).map(coerce_items).unwrap_or_default();
            let items = if items.is_empty() {
                qualitative.defaulted.push((*key).to_string());
                default(*key)
            } else {
                items
            };
            qualitative.values.insert((*key).to_string(), items);
        }
        qualitative
    }
}

/// Coerce a JSON value into a short list of non-empty strings
fn coerce_items(value: &Value) -> Vec<String> {
    let scalar = |value: &Value| match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };

    let items: Vec<String> = match value {
        Value::Array(values) => values.iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    };

    items
        .into_iter()
        .filter(|s| !s.is_empty())
        .take(MAX_QUALITATIVE_ITEMS)
        .collect()
}

/// What a strategy computes from one record
#[derive(Debug, Clone)]
pub struct Assessment {
    pub score: f64,
    pub headline: String,
    pub insights: Vec<Insight>,
    /// Metrics backing the score
    pub metrics: Value,
}

/// Domain arithmetic of one analysis task
pub trait ScoringStrategy: Send + Sync + 'static {
    const KIND: TaskKind;

    /// Record fields whose presence drives confidence
    const INPUTS: &'static [RecordField];

    /// Qualitative sub-fields to request, if any
    fn qualitative(&self) -> Option<QualitativeRequest> {
        None
    }

    /// Default payload for a qualitative key
    fn default_qualitative(&self, _key: &str) -> Vec<String> {
        Vec::new()
    }

    /// Deterministic scoring over the record and reference tables
    fn assess(
        &self,
        record: &CompanyRecord,
        reference: &ReferenceData,
        qualitative: &Qualitative,
    ) -> Result<Assessment>;
}

/// An [`AnalysisTask`] driven by a [`ScoringStrategy`]
pub struct ScoringTask<S> {
    strategy: S,
    adapter: ExtractionAdapter,
    reference: Arc<ReferenceData>,
}

impl<S: ScoringStrategy> ScoringTask<S> {
    pub fn new(strategy: S, adapter: ExtractionAdapter, reference: Arc<ReferenceData>) -> Self {
        Self {
            strategy,
            adapter,
            reference,
        }
    }

    /// Run the secondary call; failures produce the strategy's defaults
    async fn qualitative(&self, record: &CompanyRecord) -> Qualitative {
        let Some(request) = self.strategy.qualitative() else {
            return Qualitative::default();
        };
        let default = |key: &str| self.strategy.default_qualitative(key);

        let response = match prompts::render(
            prompts::QUALITATIVE_USER,
            json!({
                "task": format!("{} analysis", S::KIND.label()),
                "instruction": request.instruction,
                "company": record,
                "keys": request.keys,
            }),
        ) {
            Ok(prompt) => self.adapter.extract_structured(prompt).await,
            Err(err) => Err(err),
        };

        match response {
            Ok(object) => Qualitative::from_object(&request, &object, default),
            Err(EngineError::ProviderUnavailable) => {
                debug!(task = %S::KIND, "No provider, using default qualitative payload");
                Qualitative::defaults(&request, default)
            }
            Err(err) => {
                warn!(task = %S::KIND, error = %err, "Qualitative call failed, using defaults");
                Qualitative::defaults(&request, default)
            }
        }
    }

    async fn evaluate(&self, record: &CompanyRecord) -> Result<AnalysisOutcome> {
        let qualitative = self.qualitative(record).await;
        let assessment = self.strategy.assess(record, &self.reference, &qualitative)?;
        if !assessment.score.is_finite() {
            return Err(EngineError::task(
                S::KIND,
                format!("non-finite score {}", assessment.score),
            ));
        }

        let mut confidence = CONFIDENCE_FLOOR + CONFIDENCE_SPAN * record.completeness(S::INPUTS);
        let status = if qualitative.is_defaulted() {
            confidence -= self.adapter.config().qualitative_penalty;
            OutcomeStatus::Partial {
                reason: format!(
                    "qualitative defaults used for {}",
                    qualitative.defaulted_keys().join(", ")
                ),
            }
        } else {
            OutcomeStatus::Complete
        };

        Ok(AnalysisOutcome::new(S::KIND, assessment.score, confidence)
            .with_headline(assessment.headline)
            .with_insights(assessment.insights)
            .with_status(status)
            .with_details(json!({
                "metrics": assessment.metrics,
                "qualitative": qualitative,
            })))
    }
}

#[async_trait]
impl<S: ScoringStrategy> AnalysisTask for ScoringTask<S> {
    fn kind(&self) -> TaskKind {
        S::KIND
    }

    async fn run(&self, record: &CompanyRecord) -> AnalysisOutcome {
        match self.evaluate(record).await {
            Ok(outcome) => {
                debug!(
                    task = %S::KIND,
                    score = outcome.score,
                    confidence = outcome.confidence,
                    "Task complete"
                );
                outcome
            }
            Err(err) => {
                warn!(task = %S::KIND, error = %err, "Task failed, substituting fallback outcome");
                AnalysisOutcome::fallback(
                    S::KIND,
                    self.adapter.config().fallback_confidence,
                    err.to_string(),
                )
            }
        }
    }
}

/// The four standard tasks, sharing one adapter and one set of reference tables
pub fn default_tasks(
    adapter: &ExtractionAdapter,
    reference: &Arc<ReferenceData>,
) -> Vec<Arc<dyn AnalysisTask>> {
    vec![
        Arc::new(ScoringTask::new(
            MarketStrategy,
            adapter.clone(),
            Arc::clone(reference),
        )),
        Arc::new(ScoringTask::new(
            RiskStrategy,
            adapter.clone(),
            Arc::clone(reference),
        )),
        Arc::new(ScoringTask::new(
            CompetitiveStrategy,
            adapter.clone(),
            Arc::clone(reference),
        )),
        Arc::new(ScoringTask::new(
            PortfolioStrategy,
            adapter.clone(),
            Arc::clone(reference),
        )),
    ]
}

/// Short INR rendering of an amount, e.g. `₹14.0L` or `₹2.5Cr`
pub(crate) fn format_inr(amount: f64) -> String {
    if amount >= 1.0e7 {
        format!("₹{:.1}Cr", amount / 1.0e7)
    } else if amount >= 1.0e5 {
        format!("₹{:.1}L", amount / 1.0e5)
    } else {
        format!("₹{amount:.0}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::testing::{failing_provider, scripted_provider};
    use deal_core::InsightKind;
    use deal_llm::LLMError;

    /// Record from the reference end-to-end scenario
    pub(crate) fn sample_record() -> CompanyRecord {
        CompanyRecord::new()
            .with(RecordField::Revenue, "₹14L")
            .with(RecordField::GrowthRate, "25%")
            .with(RecordField::TeamSize, "12")
            .with(RecordField::Runway, "8 months")
    }

    /// A record where nothing parses
    pub(crate) fn garbage_record() -> CompanyRecord {
        RecordField::ALL
            .iter()
            .fold(CompanyRecord::new(), |record, field| record.with(*field, "n/a ???"))
    }

    pub(crate) fn offline_task<S: ScoringStrategy>(strategy: S) -> ScoringTask<S> {
        ScoringTask::new(
            strategy,
            ExtractionAdapter::offline(Arc::new(EngineConfig::default())),
            Arc::new(ReferenceData::builtin()),
        )
    }

    struct BrokenStrategy;

    impl ScoringStrategy for BrokenStrategy {
        const KIND: TaskKind = TaskKind::Market;
        const INPUTS: &'static [RecordField] = &[RecordField::Revenue];

        fn assess(
            &self,
            _record: &CompanyRecord,
            _reference: &ReferenceData,
            _qualitative: &Qualitative,
        ) -> Result<Assessment> {
            Err(EngineError::task(Self::KIND, "benchmark lookup failed"))
        }
    }

    struct NanStrategy;

    impl ScoringStrategy for NanStrategy {
        const KIND: TaskKind = TaskKind::Risk;
        const INPUTS: &'static [RecordField] = &[];

        fn assess(
            &self,
            _record: &CompanyRecord,
            _reference: &ReferenceData,
            _qualitative: &Qualitative,
        ) -> Result<Assessment> {
            Ok(Assessment {
                score: f64::NAN,
                headline: String::new(),
                insights: Vec::new(),
                metrics: Value::Null,
            })
        }
    }

    const KEYS: QualitativeRequest = QualitativeRequest {
        instruction: "List them.",
        keys: &["threats", "strengths"],
    };

    #[test]
    fn test_qualitative_coercion_and_per_key_defaults() {
        let object = json!({
            "threats": ["  Incumbent A ", "", 42, null, "B", "C", "D", "E"],
            "strengths": [],
        });
        let Value::Object(object) = object else {
            unreachable!()
        };

        let q = Qualitative::from_object(&KEYS, &object, |key| vec![format!("default {key}")]);
        assert_eq!(q.get("threats"), ["Incumbent A", "42", "B", "C"]);
        assert_eq!(q.get("strengths"), ["default strengths"]);
        assert_eq!(q.defaulted_keys(), ["strengths"]);
        assert!(q.get("unknown").is_empty());
    }

    #[test]
    fn test_qualitative_single_string_value() {
        let Value::Object(object) = json!({ "threats": "Price war", "strengths": "Brand" }) else {
            unreachable!()
        };
        let q = Qualitative::from_object(&KEYS, &object, |_| Vec::new());
        assert_eq!(q.get("threats"), ["Price war"]);
        assert!(!q.is_defaulted());
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(1.4e6), "₹14.0L");
        assert_eq!(format_inr(2.5e7), "₹2.5Cr");
        assert_eq!(format_inr(950.0), "₹950");
    }

    #[tokio::test]
    async fn test_failing_strategy_yields_fallback() {
        let outcome = offline_task(BrokenStrategy).run(&sample_record()).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.score, deal_core::FALLBACK_SCORE);
        assert_eq!(outcome.confidence, 60.0);
        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.insights[0].kind, InsightKind::Observation);
    }

    #[tokio::test]
    async fn test_non_finite_score_yields_fallback() {
        let outcome = offline_task(NanStrategy).run(&sample_record()).await;
        assert!(outcome.is_fallback());
        assert!(outcome.validate().is_ok());
    }

    #[tokio::test]
    async fn test_fallback_confidence_is_configurable() {
        let config = EngineConfig::builder().fallback_confidence(40.0).build().unwrap();
        let task = ScoringTask::new(
            BrokenStrategy,
            ExtractionAdapter::offline(Arc::new(config)),
            Arc::new(ReferenceData::builtin()),
        );
        assert_eq!(task.run(&sample_record()).await.confidence, 40.0);
    }

    #[tokio::test]
    async fn test_degraded_outcome_never_outranks_completed_one() {
        let config = EngineConfig::default();
        let lowest = offline_task(RiskStrategy).run(&CompanyRecord::new()).await;
        let fallback = offline_task(BrokenStrategy).run(&CompanyRecord::new()).await;

        assert!(matches!(lowest.status, OutcomeStatus::Partial { .. }));
        assert_eq!(lowest.confidence, CONFIDENCE_FLOOR - config.qualitative_penalty);
        assert!(fallback.is_fallback());
        assert!(fallback.confidence < lowest.confidence);
    }

    #[tokio::test]
    async fn test_all_tasks_survive_garbage_and_empty_records() {
        let adapter = ExtractionAdapter::offline(Arc::new(EngineConfig::default()));
        let reference = Arc::new(ReferenceData::builtin());
        for task in default_tasks(&adapter, &reference) {
            for record in [CompanyRecord::new(), garbage_record(), sample_record()] {
                let outcome = task.run(&record).await;
                assert!(outcome.validate().is_ok(), "{}: {outcome:?}", task.name());
                assert!(!outcome.is_fallback(), "{}", task.name());
                assert!(!outcome.headline.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_generated_qualitative_is_complete() {
        let provider = scripted_provider(
            r#"{"competitive_threats": ["Incumbent bundling"], "differentiators": ["Proprietary data", "Distribution", "Brand", "Regulatory licence"]}"#,
        );
        let adapter =
            ExtractionAdapter::new(Arc::new(provider), Arc::new(EngineConfig::default()));
        let task = ScoringTask::new(
            CompetitiveStrategy,
            adapter,
            Arc::new(ReferenceData::builtin()),
        );

        let outcome = task.run(&sample_record()).await;
        assert_eq!(outcome.status, OutcomeStatus::Complete);
        assert!(
            outcome
                .insights
                .iter()
                .any(|i| i.kind == InsightKind::Threat && i.insight.contains("Incumbent bundling"))
        );
    }

    #[tokio::test]
    async fn test_failed_qualitative_call_keeps_quantitative_score() {
        let reference = Arc::new(ReferenceData::builtin());
        let online = ScoringTask::new(
            RiskStrategy,
            ExtractionAdapter::new(
                Arc::new(failing_provider(|| {
                    LLMError::UnexpectedResponse("truncated body".to_string())
                })),
                Arc::new(EngineConfig::default()),
            ),
            Arc::clone(&reference),
        );
        let offline = offline_task(RiskStrategy);

        let record = sample_record();
        let failed = online.run(&record).await;
        let baseline = offline.run(&record).await;

        assert!(matches!(failed.status, OutcomeStatus::Partial { .. }));
        assert_eq!(failed.score, baseline.score);
        assert_eq!(failed.confidence, baseline.confidence);
        assert!(failed.confidence > 60.0);
    }
}
