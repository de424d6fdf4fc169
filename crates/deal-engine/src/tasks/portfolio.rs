//! Portfolio contribution: projected return blended with allocation fit

use super::{Assessment, Qualitative, ScoringStrategy};
use crate::error::{EngineError, Result};
use crate::reference::{ReferenceData, UNKNOWN_STAGE_RETENTION};
use deal_core::{CompanyRecord, Insight, InsightKind, RecordField, TaskKind};
use serde_json::json;

/// Holding period for the return projection, in years
pub const HOLDING_YEARS: i32 = 5;

/// Pre-money valuation as a multiple of revenue when none is stated
pub const DEFAULT_ENTRY_MULTIPLE: f64 = 8.0;

/// Ticket as a share of pre-money when no funding amount is stated
pub const DEFAULT_TICKET_SHARE: f64 = 0.25;

/// IRR that earns the maximum return score
pub const TARGET_IRR: f64 = 0.40;

/// Growth used for projection is clamped to this range, in percent
const GROWTH_BOUNDS: (f64, f64) = (0.0, 200.0);

const RETURN_WEIGHT: f64 = 0.7;
const FIT_WEIGHT: f64 = 0.3;

/// Allocation-fit points per unit of under-allocation
const FIT_SENSITIVITY: f64 = 40.0;

/// Scores portfolio contribution
///
/// Missing revenue uses the industry's lower-quartile revenue; missing
/// valuation and funding use [`DEFAULT_ENTRY_MULTIPLE`] and
/// [`DEFAULT_TICKET_SHARE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioStrategy;

impl ScoringStrategy for PortfolioStrategy {
    const KIND: TaskKind = TaskKind::Portfolio;
    const INPUTS: &'static [RecordField] = &[
        RecordField::Industry,
        RecordField::Revenue,
        RecordField::GrowthRate,
        RecordField::Valuation,
        RecordField::FundingAmount,
        RecordField::FundingStage,
    ];

    fn assess(
        &self,
        record: &CompanyRecord,
        reference: &ReferenceData,
        _qualitative: &Qualitative,
    ) -> Result<Assessment> {
        let industry = reference.industry(record.get(RecordField::Industry));
        let stage = reference.stage(record.get(RecordField::FundingStage));

        let revenue = record
            .amount(RecordField::Revenue)
            .unwrap_or(industry.revenue.p25);
        let growth = record
            .percent(RecordField::GrowthRate)
            .unwrap_or(0.0)
            .clamp(GROWTH_BOUNDS.0, GROWTH_BOUNDS.1);

        let pre_money = record
            .amount(RecordField::Valuation)
            .unwrap_or(revenue * DEFAULT_ENTRY_MULTIPLE);
        let ticket = record
            .amount(RecordField::FundingAmount)
            .unwrap_or(pre_money * DEFAULT_TICKET_SHARE);
        if ticket <= 0.0 || pre_money <= 0.0 {
            return Err(EngineError::task(
                Self::KIND,
                "entry valuation and ticket must be positive",
            ));
        }

        let projected_revenue = revenue * (1.0 + growth / 100.0).powi(HOLDING_YEARS);
        let exit_value = projected_revenue * industry.exit_multiple;
        let entry_ownership = ticket / (pre_money + ticket);
        let retention = stage.map_or(UNKNOWN_STAGE_RETENTION, |s| s.retention);
        let proceeds = exit_value * entry_ownership * retention;

        let moic = proceeds / ticket;
        let irr = moic.powf(1.0 / f64::from(HOLDING_YEARS)) - 1.0;
        let return_score = 1.0 + 9.0 * (irr / TARGET_IRR).clamp(0.0, 1.0);

        let allocation = industry.allocation;
        let gap = allocation.target - allocation.current;
        let fit_score = (5.0 + gap * FIT_SENSITIVITY).clamp(1.0, 10.0);

        let score = RETURN_WEIGHT * return_score + FIT_WEIGHT * fit_score;

        let mut insights = Vec::new();
        let (kind, text, implication, rank) = match moic {
            m if m >= 10.0 => (
                InsightKind::Opportunity,
                format!("Projected {m:.1}x MOIC over {HOLDING_YEARS} years"),
                "Fund-returning potential at the modelled entry price",
                8,
            ),
            m if m >= 3.0 => (
                InsightKind::Opportunity,
                format!("Projected {m:.1}x MOIC over {HOLDING_YEARS} years"),
                "Meets the return hurdle for an early-stage position",
                6,
            ),
            m if m < 1.0 => (
                InsightKind::Risk,
                format!("Projected {m:.1}x MOIC does not return capital"),
                "Entry price or growth assumptions need to change",
                7,
            ),
            m => (
                InsightKind::Observation,
                format!("Projected {m:.1}x MOIC is below venture return targets"),
                "Position sizing should stay small",
                4,
            ),
        };
        insights.push(Insight::new(kind, text, implication, rank));

        let current_pct = allocation.current * 100.0;
        let target_pct = allocation.target * 100.0;
        if gap > 0.0 {
            insights.push(Insight::new(
                InsightKind::Opportunity,
                format!(
                    "Portfolio is under-allocated to {} ({current_pct:.0}% versus {target_pct:.0}% target)",
                    industry.label
                ),
                "The deal improves portfolio balance",
                5,
            ));
        } else if gap < 0.0 {
            insights.push(Insight::new(
                InsightKind::Observation,
                format!(
                    "Portfolio is over-allocated to {} ({current_pct:.0}% versus {target_pct:.0}% target)",
                    industry.label
                ),
                "Adds concentration to an already heavy sector",
                5,
            ));
        }

        Ok(Assessment {
            score,
            headline: format!(
                "projected {moic:.1}x MOIC and {:.0}% IRR over {HOLDING_YEARS} years",
                irr * 100.0
            ),
            insights,
            metrics: json!({
                "industry": industry.key,
                "revenue": revenue,
                "growth_rate": growth,
                "projected_revenue": projected_revenue,
                "exit_multiple": industry.exit_multiple,
                "exit_value": exit_value,
                "pre_money": pre_money,
                "ticket": ticket,
                "entry_ownership": entry_ownership,
                "retention": retention,
                "moic": moic,
                "irr": irr,
                "return_score": return_score,
                "allocation_fit": fit_score,
            }),
        })
    }
}
