//! Market fit: revenue and growth against industry benchmarks, plus market size

use super::{Assessment, Qualitative, ScoringStrategy};
use crate::error::Result;
use crate::reference::ReferenceData;
use deal_core::{CompanyRecord, Insight, InsightKind, RecordField, TaskKind};
use serde_json::json;

const REVENUE_WEIGHT: f64 = 0.4;
const GROWTH_WEIGHT: f64 = 0.4;
const MARKET_WEIGHT: f64 = 0.2;

/// Market-size tier in `[0, 1]`
fn market_tier(size: f64) -> f64 {
    match size {
        s if s >= 1.0e10 => 1.0,
        s if s >= 1.0e9 => 0.7,
        s if s >= 1.0e8 => 0.4,
        _ => 0.2,
    }
}

/// Scores market fit
///
/// Missing revenue and growth count as zero. A missing market size uses the
/// industry default.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketStrategy;

impl ScoringStrategy for MarketStrategy {
    const KIND: TaskKind = TaskKind::Market;
    const INPUTS: &'static [RecordField] = &[
        RecordField::Industry,
        RecordField::Revenue,
        RecordField::GrowthRate,
        RecordField::MarketSize,
    ];

    fn assess(
        &self,
        record: &CompanyRecord,
        reference: &ReferenceData,
        _qualitative: &Qualitative,
    ) -> Result<Assessment> {
        let industry = reference.industry(record.get(RecordField::Industry));

        let revenue = record.amount(RecordField::Revenue).unwrap_or(0.0);
        let growth = record.percent(RecordField::GrowthRate).unwrap_or(0.0);
        let market_size = record.amount(RecordField::MarketSize);
        let market_size_defaulted = market_size.is_none();
        let market_size = market_size.unwrap_or(industry.market_size);

        let revenue_pct = industry.revenue.percentile(revenue);
        let growth_pct = industry.growth.percentile(growth);
        let tier = market_tier(market_size);

        let score = 1.0
            + 9.0
                * (REVENUE_WEIGHT * revenue_pct / 100.0
                    + GROWTH_WEIGHT * growth_pct / 100.0
                    + MARKET_WEIGHT * tier);

        let mut insights = Vec::new();
        if growth_pct >= 75.0 {
            insights.push(Insight::new(
                InsightKind::Strength,
                format!("Growth of {growth:.0}% is top-quartile for {}", industry.label),
                "Momentum supports a premium entry valuation",
                8,
            ));
        } else if growth_pct <= 25.0 {
            insights.push(Insight::new(
                InsightKind::Risk,
                format!("Growth of {growth:.0}% trails most {} peers", industry.label),
                "Traction needs to accelerate before the next round",
                7,
            ));
        } else {
            insights.push(Insight::new(
                InsightKind::Observation,
                format!("Growth of {growth:.0}% is in line with {} peers", industry.label),
                "Growth alone does not differentiate the company",
                4,
            ));
        }

        if revenue_pct >= 75.0 {
            insights.push(Insight::new(
                InsightKind::Strength,
                format!(
                    "Revenue of {} is top-quartile for the stage",
                    super::format_inr(revenue)
                ),
                "Commercial validation is ahead of peers",
                7,
            ));
        } else if revenue_pct <= 25.0 {
            insights.push(Insight::new(
                InsightKind::Risk,
                format!(
                    "Revenue of {} sits in the bottom quartile",
                    super::format_inr(revenue)
                ),
                "Product-market fit is not yet evidenced by revenue",
                6,
            ));
        }

        if tier >= 0.7 {
            insights.push(Insight::new(
                InsightKind::Opportunity,
                format!(
                    "Addressable market of {} supports a venture-scale outcome",
                    super::format_inr(market_size)
                ),
                "Room to grow well beyond the current niche",
                6,
            ));
        } else if tier <= 0.4 {
            insights.push(Insight::new(
                InsightKind::Risk,
                format!(
                    "Addressable market of {} caps the upside",
                    super::format_inr(market_size)
                ),
                "Exit size may be limited",
                6,
            ));
        }

        Ok(Assessment {
            score,
            headline: format!(
                "revenue at P{revenue_pct:.0} and growth at P{growth_pct:.0} of {} benchmarks",
                industry.label
            ),
            insights,
            metrics: json!({
                "industry": industry.key,
                "revenue": revenue,
                "revenue_percentile": revenue_pct,
                "growth_rate": growth,
                "growth_percentile": growth_pct,
                "market_size": market_size,
                "market_size_defaulted": market_size_defaulted,
                "market_tier": tier,
            }),
        })
    }
}
