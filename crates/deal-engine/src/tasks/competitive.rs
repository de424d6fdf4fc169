//! Competitive strength: position among comparables plus differentiation

use super::{Assessment, Qualitative, QualitativeRequest, ScoringStrategy};
use crate::error::Result;
use crate::reference::{ReferenceData, rank_among};
use deal_core::{CompanyRecord, Insight, InsightKind, RecordField, TaskKind};
use serde_json::json;

const GROWTH_WEIGHT: f64 = 0.5;
const REVENUE_WEIGHT: f64 = 0.3;
const MOAT_WEIGHT: f64 = 0.2;

/// Differentiators needed for a full moat factor
const FULL_MOAT: usize = 4;

/// Valuation multiple above this factor of the comparable median is rich
const RICH_VALUATION_FACTOR: f64 = 1.5;
/// Valuation multiple below this factor of the comparable median is cheap
const CHEAP_VALUATION_FACTOR: f64 = 0.75;

const COMPETITIVE_THREATS: &str = "competitive_threats";
const DIFFERENTIATORS: &str = "differentiators";

/// Scores competitive strength
#[derive(Debug, Clone, Copy, Default)]
pub struct CompetitiveStrategy;

impl ScoringStrategy for CompetitiveStrategy {
    const KIND: TaskKind = TaskKind::Competitive;
    const INPUTS: &'static [RecordField] = &[
        RecordField::Industry,
        RecordField::Revenue,
        RecordField::GrowthRate,
        RecordField::Valuation,
    ];

    fn qualitative(&self) -> Option<QualitativeRequest> {
        Some(QualitativeRequest {
            instruction: "Name the main competitive threats and the company's defensible \
                          differentiators.",
            keys: &[COMPETITIVE_THREATS, DIFFERENTIATORS],
        })
    }

    fn default_qualitative(&self, key: &str) -> Vec<String> {
        let items: &[&str] = match key {
            COMPETITIVE_THREATS => &["Well-funded incumbents expanding into the segment"],
            DIFFERENTIATORS => &["Local market knowledge", "Early customer relationships"],
            _ => &[],
        };
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn assess(
        &self,
        record: &CompanyRecord,
        reference: &ReferenceData,
        qualitative: &Qualitative,
    ) -> Result<Assessment> {
        let industry = reference.industry(record.get(RecordField::Industry));
        let comparables = &industry.comparables;

        let revenue = record.amount(RecordField::Revenue).unwrap_or(0.0);
        let growth = record.percent(RecordField::GrowthRate).unwrap_or(0.0);

        let revenue_position = rank_among(revenue, comparables.iter().map(|c| c.revenue));
        let growth_position = rank_among(growth, comparables.iter().map(|c| c.growth_pct));
        let differentiators = qualitative.get(DIFFERENTIATORS);
        let moat = differentiators.len().min(FULL_MOAT) as f64 / FULL_MOAT as f64;

        let score = 1.0
            + 9.0
                * (GROWTH_WEIGHT * growth_position / 100.0
                    + REVENUE_WEIGHT * revenue_position / 100.0
                    + MOAT_WEIGHT * moat);

        let outgrown = comparables.iter().filter(|c| c.growth_pct < growth).count();

        let mut insights = Vec::new();
        if growth_position >= 60.0 {
            insights.push(Insight::new(
                InsightKind::Strength,
                format!(
                    "Growing faster than {outgrown} of {} {} comparables",
                    comparables.len(),
                    industry.label
                ),
                "Share gains are likely if momentum holds",
                6,
            ));
        } else if growth_position <= 20.0 {
            insights.push(Insight::new(
                InsightKind::Threat,
                format!("Slower growth than most {} comparables", industry.label),
                "Faster rivals may lock up the best customers",
                6,
            ));
        }

        for threat in qualitative.get(COMPETITIVE_THREATS).iter().take(3) {
            insights.push(Insight::new(
                InsightKind::Threat,
                threat.clone(),
                "Could compress pricing or slow customer acquisition",
                6,
            ));
        }

        let valuation_multiple = record
            .amount(RecordField::Valuation)
            .zip(record.amount(RecordField::Revenue))
            .map(|(valuation, revenue)| valuation / revenue);
        let peer_multiple = industry.comparable_multiple();

        if let (Some(multiple), Some(peer)) = (valuation_multiple, peer_multiple) {
            if multiple > peer * RICH_VALUATION_FACTOR {
                insights.push(Insight::new(
                    InsightKind::Risk,
                    format!("Valuation at {multiple:.1}x revenue versus a {peer:.1}x peer median"),
                    "Entry price leaves little margin for execution misses",
                    6,
                ));
            } else if multiple < peer * CHEAP_VALUATION_FACTOR {
                insights.push(Insight::new(
                    InsightKind::Opportunity,
                    format!("Valuation at {multiple:.1}x revenue versus a {peer:.1}x peer median"),
                    "Entry price is attractive relative to comparables",
                    6,
                ));
            }
        }

        Ok(Assessment {
            score,
            headline: format!(
                "ahead of {outgrown} of {} comparables on growth",
                comparables.len()
            ),
            insights,
            metrics: json!({
                "industry": industry.key,
                "comparables": comparables.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "revenue_position": revenue_position,
                "growth_position": growth_position,
                "moat": moat,
                "differentiators": differentiators,
                "valuation_multiple": valuation_multiple,
                "peer_multiple": peer_multiple,
            }),
        })
    }
}
