//! End-to-end analysis runs

use async_trait::async_trait;
use deal_core::{
    AnalysisOutcome, CompanyRecord, RecommendationTier, RecordField, RecordSource, TaskKind,
};
use deal_engine::tasks::{Assessment, Qualitative};
use deal_engine::{
    AnalysisInput, DemoProfile, EngineConfig, EngineError, ExtractionAdapter, Orchestrator,
    ReferenceData, ScoringStrategy, ScoringTask, Synthesizer, default_tasks, prompts,
};
use deal_llm::{CompletionRequest, CompletionResponse, LLMProvider};
use std::sync::Arc;

fn sample_record() -> CompanyRecord {
    CompanyRecord::new()
        .with(RecordField::Revenue, "₹14L")
        .with(RecordField::GrowthRate, "25%")
        .with(RecordField::TeamSize, "12")
        .with(RecordField::Runway, "8 months")
}

/// Answers extraction prompts with a fixed record and everything else with `{}`
struct ScriptedProvider {
    extraction: String,
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> deal_llm::Result<CompletionResponse> {
        let text = if request.system.as_deref() == Some(prompts::EXTRACTION_SYSTEM) {
            self.extraction.clone()
        } else {
            "{}".to_string()
        };
        Ok(CompletionResponse::text(text))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct BrokenMarket;

impl ScoringStrategy for BrokenMarket {
    const KIND: TaskKind = TaskKind::Market;
    const INPUTS: &'static [RecordField] = &[RecordField::Revenue];

    fn assess(
        &self,
        _record: &CompanyRecord,
        _reference: &ReferenceData,
        _qualitative: &Qualitative,
    ) -> deal_engine::Result<Assessment> {
        Err(EngineError::task(Self::KIND, "benchmark table unavailable"))
    }
}

#[tokio::test]
async fn test_reference_scenario_lands_in_plausible_band() {
    let config = Arc::new(EngineConfig::default());
    let adapter = ExtractionAdapter::offline(config);
    let reference = Arc::new(ReferenceData::builtin());
    let record = sample_record();

    let mut outcomes = Vec::new();
    for task in default_tasks(&adapter, &reference) {
        let outcome = task.run(&record).await;
        assert!(outcome.validate().is_ok());
        assert!(!outcome.is_fallback());
        outcomes.push(outcome);
    }

    let report = Synthesizer::new()
        .synthesize(&record, &RecordSource::Extracted, &outcomes)
        .unwrap();

    assert!(
        (5.0..=8.0).contains(&report.weighted_score),
        "weighted score {} outside the plausible band",
        report.weighted_score
    );
    assert_eq!(
        report.tier,
        RecommendationTier::from_score(report.weighted_score)
    );
    assert!(!report.top_insights.is_empty());
    assert!(report.top_insights.len() <= 5);
    assert!(
        report
            .top_insights
            .windows(2)
            .all(|w| w[0].impact_rank >= w[1].impact_rank)
    );
}

#[tokio::test]
async fn test_document_run_through_provider() {
    let provider = ScriptedProvider {
        extraction: r#"```json
{"companyName": "KrishiLink", "industry": "Agritech", "revenue": "₹14L",
 "growthRate": "25%", "teamSize": 12, "runway": "8 months"}
```"#
            .to_string(),
    };
    let orchestrator = Orchestrator::builder()
        .provider(Arc::new(provider))
        .build()
        .unwrap();

    let bundle = orchestrator
        .analyze(&AnalysisInput::document("KrishiLink seed memo"), None)
        .await
        .unwrap();

    assert_eq!(bundle.source, RecordSource::Extracted);
    assert_eq!(bundle.record.display_name(), "KrishiLink");
    assert_eq!(bundle.report.company, "KrishiLink");
    let kinds: Vec<TaskKind> = bundle.outcomes.iter().map(|o| o.task).collect();
    assert_eq!(kinds, TaskKind::ALL);
    assert!(bundle.report.executive_summary.starts_with("KrishiLink (Agritech"));
}

#[tokio::test]
async fn test_unusable_document_still_reports() {
    let provider = ScriptedProvider {
        extraction: "Sorry, I cannot help with that.".to_string(),
    };
    let orchestrator = Orchestrator::builder()
        .provider(Arc::new(provider))
        .build()
        .unwrap();

    let bundle = orchestrator
        .analyze(&AnalysisInput::document("unreadable scan"), None)
        .await
        .unwrap();

    assert!(bundle.source.is_defaulted());
    assert_eq!(bundle.record, deal_engine::default_record());
    assert!(
        bundle
            .report
            .next_steps
            .iter()
            .any(|s| s.contains("data room"))
    );
}

#[tokio::test]
async fn test_failed_task_degrades_gracefully() {
    let config = Arc::new(EngineConfig::default());
    let broken = ScoringTask::new(
        BrokenMarket,
        ExtractionAdapter::offline(config),
        Arc::new(ReferenceData::builtin()),
    );
    let orchestrator = Orchestrator::builder()
        .task(Arc::new(broken))
        .build()
        .unwrap();

    let bundle = orchestrator
        .analyze(&AnalysisInput::Demo(DemoProfile::Cleantech), None)
        .await
        .unwrap();

    let market = bundle.outcome(TaskKind::Market).unwrap();
    assert!(market.is_fallback());
    assert_eq!(market.score, deal_core::FALLBACK_SCORE);
    assert_eq!(market.confidence, 60.0);
    assert_eq!(market.insights.len(), 1);

    assert_eq!(bundle.report.degraded_tasks(), [TaskKind::Market]);
    assert!(
        bundle
            .report
            .next_steps
            .iter()
            .any(|s| s == "Re-run the market analysis once inputs are complete")
    );
}

#[tokio::test]
async fn test_runs_are_reproducible() {
    let orchestrator = Orchestrator::builder().build().unwrap();
    let input = AnalysisInput::Demo(DemoProfile::Fintech);

    let first = orchestrator.analyze(&input, None).await.unwrap();
    let second = orchestrator.analyze(&input, None).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.outcomes, second.outcomes);
    assert_eq!(
        first.report.without_timestamp(),
        second.report.without_timestamp()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_are_isolated() {
    let orchestrator = Arc::new(Orchestrator::builder().build().unwrap());

    let solo_agritech = orchestrator
        .analyze(&AnalysisInput::Demo(DemoProfile::Agritech), None)
        .await
        .unwrap();
    let solo_fintech = orchestrator
        .analyze(&AnalysisInput::Demo(DemoProfile::Fintech), None)
        .await
        .unwrap();

    let agritech_input = AnalysisInput::Demo(DemoProfile::Agritech);
    let fintech_input = AnalysisInput::Demo(DemoProfile::Fintech);
    let (agritech, fintech) = tokio::join!(
        orchestrator.analyze(&agritech_input, None),
        orchestrator.analyze(&fintech_input, None),
    );
    let (agritech, fintech) = (agritech.unwrap(), fintech.unwrap());

    assert_eq!(agritech.record.display_name(), "KrishiLink");
    assert_eq!(fintech.record.display_name(), "PayVeda");
    assert_eq!(agritech.outcomes, solo_agritech.outcomes);
    assert_eq!(fintech.outcomes, solo_fintech.outcomes);
    assert_ne!(agritech.outcomes, fintech.outcomes);
    assert_eq!(
        agritech.report.without_timestamp(),
        solo_agritech.report.without_timestamp()
    );
}

#[tokio::test]
async fn test_every_task_survives_empty_record() {
    let adapter = ExtractionAdapter::offline(Arc::new(EngineConfig::default()));
    let reference = Arc::new(ReferenceData::builtin());
    let outcomes: Vec<AnalysisOutcome> = {
        let mut outcomes = Vec::new();
        for task in default_tasks(&adapter, &reference) {
            outcomes.push(task.run(&CompanyRecord::new()).await);
        }
        outcomes
    };

    for outcome in &outcomes {
        assert!((1.0..=10.0).contains(&outcome.score));
        assert!((0.0..=100.0).contains(&outcome.confidence));
    }

    let report = Synthesizer::new()
        .synthesize(&CompanyRecord::new(), &RecordSource::Extracted, &outcomes)
        .unwrap();
    assert!(report.weighted_score.is_finite());
}
