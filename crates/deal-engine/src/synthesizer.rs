//! Synthesizer: merges the four outcomes into one recommendation
//!
//! Everything here is a pure function of its inputs except the report
//! timestamp. Weights and tier thresholds are fixed constants.

use crate::prompts;
use deal_core::{
    AnalysisOutcome, CompanyRecord, Error, Insight, InsightKind, RecommendationTier,
    RecordField, RecordSource, Result, SynthesizedReport, TaskKind, TaskScore,
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

pub const MARKET_WEIGHT: f64 = 0.30;
pub const RISK_WEIGHT: f64 = 0.25;
pub const COMPETITIVE_WEIGHT: f64 = 0.20;
pub const PORTFOLIO_WEIGHT: f64 = 0.25;

/// Insights kept in the report
pub const TOP_INSIGHTS: usize = 5;

/// Consolidated risks kept in the report
pub const MAX_RISKS: usize = 8;

/// Risk score at or above which finances are audited
pub const HIGH_RISK_THRESHOLD: f64 = 7.0;

/// Market score at or above which market sizing is validated with customers
pub const STRONG_MARKET_THRESHOLD: f64 = 7.0;

/// Fixed weight of a task; the four weights sum to 1
pub fn weight(task: TaskKind) -> f64 {
    match task {
        TaskKind::Market => MARKET_WEIGHT,
        TaskKind::Risk => RISK_WEIGHT,
        TaskKind::Competitive => COMPETITIVE_WEIGHT,
        TaskKind::Portfolio => PORTFOLIO_WEIGHT,
    }
}

/// Score oriented so that higher is always better (risk is inverted)
pub fn oriented_score(task: TaskKind, score: f64) -> f64 {
    match task {
        TaskKind::Risk => 10.0 - score,
        _ => score,
    }
}

/// Check the outcome set and return it in canonical task order
fn canonical(outcomes: &[AnalysisOutcome]) -> Result<Vec<&AnalysisOutcome>> {
    if outcomes.len() != TaskKind::ALL.len() {
        return Err(Error::SynthesisInputInvalid(format!(
            "expected {} outcomes, got {}",
            TaskKind::ALL.len(),
            outcomes.len()
        )));
    }

    TaskKind::ALL
        .iter()
        .map(|kind| {
            let mut matching = outcomes.iter().filter(|o| o.task == *kind);
            match (matching.next(), matching.next()) {
                (Some(outcome), None) => {
                    outcome.validate()?;
                    Ok(outcome)
                }
                (None, _) => Err(Error::SynthesisInputInvalid(format!(
                    "missing {kind} outcome"
                ))),
                (Some(_), Some(_)) => Err(Error::SynthesisInputInvalid(format!(
                    "duplicate {kind} outcome"
                ))),
            }
        })
        .collect()
}

/// Weighted score of a complete outcome set
pub fn weighted_score(outcomes: &[AnalysisOutcome]) -> Result<f64> {
    Ok(canonical(outcomes)?
        .into_iter()
        .map(|o| weight(o.task) * oriented_score(o.task, o.score))
        .sum())
}

/// Merges outcomes into a [`SynthesizedReport`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer;

impl Synthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the report
    ///
    /// Fails only when the outcome set breaks the contract: not exactly one
    /// outcome per task, or a score/confidence out of range.
    pub fn synthesize(
        &self,
        record: &CompanyRecord,
        source: &RecordSource,
        outcomes: &[AnalysisOutcome],
    ) -> Result<SynthesizedReport> {
        let ordered = canonical(outcomes)?;

        let breakdown: Vec<TaskScore> = ordered
            .iter()
            .map(|o| {
                let oriented = oriented_score(o.task, o.score);
                TaskScore {
                    task: o.task,
                    raw_score: o.score,
                    oriented_score: oriented,
                    weight: weight(o.task),
                    contribution: weight(o.task) * oriented,
                    confidence: o.confidence,
                    degraded: o.is_fallback(),
                }
            })
            .collect();

        let weighted_score: f64 = breakdown.iter().map(|s| s.contribution).sum();
        let confidence: f64 = breakdown.iter().map(|s| s.weight * s.confidence).sum();
        let tier = RecommendationTier::from_score(weighted_score);

        let top_insights = top_insights(&ordered);
        let risks = consolidated_risks(&ordered);
        let next_steps = next_steps(&ordered, source, tier);
        let executive_summary = executive_summary(record, &ordered, weighted_score, tier, confidence);

        Ok(SynthesizedReport {
            company: record.display_name().to_string(),
            weighted_score,
            tier,
            confidence,
            executive_summary,
            top_insights,
            risks,
            next_steps,
            breakdown,
            generated_at: Utc::now(),
        })
    }
}

/// Union of all insights, by descending impact; ties keep canonical task order
fn top_insights(ordered: &[&AnalysisOutcome]) -> Vec<Insight> {
    let mut insights: Vec<Insight> = ordered
        .iter()
        .flat_map(|o| o.insights.iter().cloned())
        .collect();
    insights.sort_by(|a, b| b.impact_rank.cmp(&a.impact_rank));
    insights.truncate(TOP_INSIGHTS);
    insights
}

/// Adverse insight texts, by descending impact, without duplicates
fn consolidated_risks(ordered: &[&AnalysisOutcome]) -> Vec<String> {
    let mut adverse: Vec<&Insight> = ordered
        .iter()
        .flat_map(|o| o.insights.iter())
        .filter(|i| i.kind.is_adverse())
        .collect();
    adverse.sort_by(|a, b| b.impact_rank.cmp(&a.impact_rank));

    let mut risks: Vec<String> = Vec::new();
    for insight in adverse {
        if !risks.contains(&insight.insight) {
            risks.push(insight.insight.clone());
        }
    }
    risks.truncate(MAX_RISKS);
    risks
}

fn next_steps(
    ordered: &[&AnalysisOutcome],
    source: &RecordSource,
    tier: RecommendationTier,
) -> Vec<String> {
    let score_of = |task: TaskKind| {
        ordered
            .iter()
            .find(|o| o.task == task && !o.is_fallback())
            .map(|o| o.score)
    };

    let mut steps = Vec::new();
    if score_of(TaskKind::Risk).is_some_and(|s| s >= HIGH_RISK_THRESHOLD) {
        steps.push("Audit finances: verify burn, runway and unit economics".to_string());
    }
    if ordered
        .iter()
        .flat_map(|o| o.insights.iter())
        .any(|i| i.kind == InsightKind::Threat)
    {
        steps.push("Deepen competitive research on the flagged threats".to_string());
    }
    if score_of(TaskKind::Market).is_some_and(|s| s >= STRONG_MARKET_THRESHOLD) {
        steps.push("Validate market sizing through customer interviews".to_string());
    }
    for outcome in ordered.iter().filter(|o| o.is_fallback()) {
        steps.push(format!(
            "Re-run the {} analysis once inputs are complete",
            outcome.task.label().to_lowercase()
        ));
    }
    if source.is_defaulted() {
        steps.push("Request the full data room: the company record is a default template".to_string());
    }
    steps.push(
        match tier {
            RecommendationTier::StrongBuy => "Move to term sheet discussions",
            RecommendationTier::ProceedWithCaution => {
                "Schedule a partner meeting to resolve open diligence items"
            }
            RecommendationTier::Pass => "Decline for now and revisit at the next funding milestone",
        }
        .to_string(),
    );
    steps
}

fn executive_summary(
    record: &CompanyRecord,
    ordered: &[&AnalysisOutcome],
    score: f64,
    tier: RecommendationTier,
    confidence: f64,
) -> String {
    let company = record.display_name();
    let industry = record.get(RecordField::Industry).unwrap_or("industry not stated");
    let stage = record
        .get(RecordField::FundingStage)
        .unwrap_or("stage not stated");
    let headlines: Vec<_> = ordered
        .iter()
        .map(|o| json!({ "label": o.task.label(), "headline": o.headline }))
        .collect();
    let degraded: Vec<&str> = ordered
        .iter()
        .filter(|o| o.is_fallback())
        .map(|o| o.task.label())
        .collect();

    let vars = json!({
        "company": company,
        "industry": industry,
        "stage": stage,
        "score": format!("{score:.1}"),
        "tier": tier.as_str(),
        "confidence": format!("{confidence:.0}"),
        "headlines": headlines,
        "degraded": degraded,
    });

    prompts::render(prompts::EXECUTIVE_SUMMARY, vars).unwrap_or_else(|err| {
        warn!(error = %err, "Summary template failed, using plain summary");
        format!("{company} receives a weighted score of {score:.1}/10, rated {tier}.")
    })
}
