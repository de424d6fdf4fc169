//! Final investment report types

use crate::outcome::{AnalysisOutcome, Insight, TaskKind};
use crate::record::CompanyRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Weighted score at or above which the tier is `StrongBuy`
pub const STRONG_BUY_THRESHOLD: f64 = 8.0;

/// Weighted score at or above which the tier is `ProceedWithCaution`
pub const PROCEED_THRESHOLD: f64 = 6.0;

/// Recommendation tier, a pure function of the weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationTier {
    StrongBuy,
    ProceedWithCaution,
    Pass,
}

impl RecommendationTier {
    /// Map a weighted score onto a tier using the fixed thresholds
    pub fn from_score(score: f64) -> Self {
        if score >= STRONG_BUY_THRESHOLD {
            Self::StrongBuy
        } else if score >= PROCEED_THRESHOLD {
            Self::ProceedWithCaution
        } else {
            Self::Pass
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::ProceedWithCaution => "PROCEED_WITH_CAUTION",
            Self::Pass => "PASS",
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task's share of the weighted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskScore {
    pub task: TaskKind,
    /// Score as reported by the task
    pub raw_score: f64,
    /// Score after orientation (risk is inverted)
    pub oriented_score: f64,
    pub weight: f64,
    pub contribution: f64,
    pub confidence: f64,
    pub degraded: bool,
}

/// The merged investment recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedReport {
    pub company: String,
    pub weighted_score: f64,
    pub tier: RecommendationTier,
    /// Weight-averaged task confidence, 0 to 100
    pub confidence: f64,
    pub executive_summary: String,
    pub top_insights: Vec<Insight>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
    pub breakdown: Vec<TaskScore>,
    pub generated_at: DateTime<Utc>,
}

impl SynthesizedReport {
    /// Copy of the report with the timestamp zeroed, for reproducibility checks
    pub fn without_timestamp(&self) -> Self {
        Self {
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
            ..self.clone()
        }
    }

    /// Tasks that fell back to a degraded outcome
    pub fn degraded_tasks(&self) -> Vec<TaskKind> {
        self.breakdown
            .iter()
            .filter(|s| s.degraded)
            .map(|s| s.task)
            .collect()
    }
}

/// Where the company record came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RecordSource {
    /// Parsed from a generative-text extraction
    Extracted,
    /// Canned demo profile
    Demo { profile: String },
    /// Extraction failed; default template substituted
    Defaulted { reason: String },
}

impl RecordSource {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }
}

/// Everything one analysis run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBundle {
    pub run_id: Uuid,
    pub record: CompanyRecord,
    pub source: RecordSource,
    /// One outcome per task, in canonical task order
    pub outcomes: Vec<AnalysisOutcome>,
    pub report: SynthesizedReport,
}

impl ReportBundle {
    /// Outcome of a specific task
    pub fn outcome(&self, task: TaskKind) -> Option<&AnalysisOutcome> {
        self.outcomes.iter().find(|o| o.task == task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RecommendationTier::from_score(8.0), RecommendationTier::StrongBuy);
        assert_eq!(RecommendationTier::from_score(9.7), RecommendationTier::StrongBuy);
        assert_eq!(
            RecommendationTier::from_score(7.999),
            RecommendationTier::ProceedWithCaution
        );
        assert_eq!(
            RecommendationTier::from_score(6.0),
            RecommendationTier::ProceedWithCaution
        );
        assert_eq!(RecommendationTier::from_score(5.999), RecommendationTier::Pass);
        assert_eq!(RecommendationTier::from_score(1.0), RecommendationTier::Pass);
    }

    #[test]
    fn test_tier_serialization() {
        let json = serde_json::to_string(&RecommendationTier::ProceedWithCaution).unwrap();
        assert_eq!(json, "\"PROCEED_WITH_CAUTION\"");
        assert_eq!(RecommendationTier::StrongBuy.to_string(), "STRONG_BUY");
    }

    #[test]
    fn test_record_source() {
        let source = RecordSource::Defaulted {
            reason: "empty document".to_string(),
        };
        assert!(source.is_defaulted());
        assert!(!RecordSource::Extracted.is_defaulted());

        let json = serde_json::to_value(RecordSource::Demo {
            profile: "agritech".to_string(),
        })
        .unwrap();
        assert_eq!(json["source"], "demo");
    }
}
