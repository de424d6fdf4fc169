//! Per-task analysis outcomes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score every outcome is clamped into
pub const SCORE_RANGE: (f64, f64) = (1.0, 10.0);

/// Score assigned to a fallback outcome (midpoint, no signal either way)
pub const FALLBACK_SCORE: f64 = 5.0;

/// The four independent analysis tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Market position and fit
    Market,
    /// Risk magnitude (higher is worse)
    Risk,
    /// Competitive strength
    Competitive,
    /// Portfolio contribution
    Portfolio,
}

impl TaskKind {
    /// All tasks in canonical order
    pub const ALL: [TaskKind; 4] = [Self::Market, Self::Risk, Self::Competitive, Self::Portfolio];

    /// Stable identifier used in logs and progress messages
    pub fn id(&self) -> &'static str {
        match self {
            Self::Market => "market-analysis",
            Self::Risk => "risk-assessment",
            Self::Competitive => "competitive-analysis",
            Self::Portfolio => "portfolio-impact",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Risk => "Risk",
            Self::Competitive => "Competitive",
            Self::Portfolio => "Portfolio",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Category of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Strength,
    Opportunity,
    Risk,
    Threat,
    Observation,
}

impl InsightKind {
    /// Whether insights of this kind belong in the consolidated risk list
    pub fn is_adverse(&self) -> bool {
        matches!(self, Self::Risk | Self::Threat)
    }
}

/// A single typed finding produced by a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub insight: String,
    pub implication: String,
    /// 1 (minor) to 10 (decisive)
    pub impact_rank: u8,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        insight: impl Into<String>,
        implication: impl Into<String>,
        impact_rank: u8,
    ) -> Self {
        Self {
            kind,
            insight: insight.into(),
            implication: implication.into(),
            impact_rank: impact_rank.clamp(1, 10),
        }
    }
}

/// How an outcome was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Quantitative and qualitative parts both computed
    Complete,
    /// Quantitative score computed, qualitative payload defaulted
    Partial { reason: String },
    /// Computation failed; fixed fallback substituted
    Fallback { reason: String },
}

/// Result of one analysis task
///
/// Score and confidence are always present. A failed task produces a
/// fallback outcome rather than an error, so the synthesizer always
/// receives four outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub task: TaskKind,
    /// 1 to 10
    pub score: f64,
    /// 0 to 100
    pub confidence: f64,
    /// Headline metric for the executive summary
    pub headline: String,
    pub insights: Vec<Insight>,
    pub status: OutcomeStatus,
    /// Task-specific payload, opaque outside the producing task
    pub details: serde_json::Value,
}

impl AnalysisOutcome {
    /// Create a complete outcome; score and confidence are clamped into range
    pub fn new(task: TaskKind, score: f64, confidence: f64) -> Self {
        Self {
            task,
            score: clamp_score(score),
            confidence: clamp_confidence(confidence),
            headline: String::new(),
            insights: Vec::new(),
            status: OutcomeStatus::Complete,
            details: serde_json::Value::Null,
        }
    }

    /// Fallback outcome for a task whose computation failed
    pub fn fallback(task: TaskKind, confidence: f64, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            task,
            score: FALLBACK_SCORE,
            confidence: clamp_confidence(confidence),
            headline: format!("{} analysis unavailable", task.label().to_lowercase()),
            insights: vec![Insight::new(
                InsightKind::Observation,
                format!("{} analysis ran in degraded mode", task.label()),
                "Score is a neutral placeholder; verify this area manually",
                1,
            )],
            status: OutcomeStatus::Fallback { reason },
            details: serde_json::Value::Null,
        }
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = headline.into();
        self
    }

    pub fn with_insights(mut self, insights: Vec<Insight>) -> Self {
        self.insights = insights;
        self
    }

    pub fn with_status(mut self, status: OutcomeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Whether this outcome came from the fallback path
    pub fn is_fallback(&self) -> bool {
        matches!(self.status, OutcomeStatus::Fallback { .. })
    }

    /// Check the score/confidence contract
    pub fn validate(&self) -> Result<()> {
        let (min, max) = SCORE_RANGE;
        if !self.score.is_finite() || self.score < min || self.score > max {
            return Err(Error::InvalidOutcome {
                task: self.task,
                detail: format!("score {} outside [{min}, {max}]", self.score),
            });
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(Error::InvalidOutcome {
                task: self.task,
                detail: format!("confidence {} outside [0, 100]", self.confidence),
            });
        }
        Ok(())
    }
}

/// Clamp a score into [`SCORE_RANGE`]; non-finite scores become the fallback score
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(SCORE_RANGE.0, SCORE_RANGE.1)
    } else {
        FALLBACK_SCORE
    }
}

/// Clamp a confidence into `[0, 100]`; non-finite values become `0`
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps() {
        let outcome = AnalysisOutcome::new(TaskKind::Market, 14.0, -3.0);
        assert_eq!(outcome.score, 10.0);
        assert_eq!(outcome.confidence, 0.0);

        let outcome = AnalysisOutcome::new(TaskKind::Market, f64::NAN, f64::INFINITY);
        assert_eq!(outcome.score, FALLBACK_SCORE);
        assert_eq!(outcome.confidence, 0.0);
        assert!(outcome.validate().is_ok());
    }

    #[test]
    fn test_fallback_outcome() {
        let outcome = AnalysisOutcome::fallback(TaskKind::Risk, 60.0, "boom");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.score, FALLBACK_SCORE);
        assert_eq!(outcome.confidence, 60.0);
        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.insights[0].kind, InsightKind::Observation);
        assert_eq!(outcome.headline, "risk analysis unavailable");
    }

    #[test]
    fn test_validate_rejects_hand_built_outcome() {
        let mut outcome = AnalysisOutcome::new(TaskKind::Portfolio, 5.0, 80.0);
        outcome.score = 11.0;
        assert!(outcome.validate().is_err());

        outcome.score = 5.0;
        outcome.confidence = f64::NAN;
        assert!(outcome.validate().is_err());
    }

    #[test]
    fn test_insight_rank_clamped() {
        assert_eq!(Insight::new(InsightKind::Risk, "a", "b", 0).impact_rank, 1);
        assert_eq!(Insight::new(InsightKind::Risk, "a", "b", 42).impact_rank, 10);
    }

    #[test]
    fn test_insight_serializes_type_key() {
        let insight = Insight::new(InsightKind::Threat, "New entrant", "Price pressure", 6);
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "threat");
        assert_eq!(json["impact_rank"], 6);
    }

    #[test]
    fn test_task_kind_ids() {
        let ids: Vec<_> = TaskKind::ALL.iter().map(TaskKind::id).collect();
        assert_eq!(
            ids,
            vec![
                "market-analysis",
                "risk-assessment",
                "competitive-analysis",
                "portfolio-impact"
            ]
        );
    }
}
