//! Risk magnitude: runway, burn, industry, team and stage
//!
//! Higher score means a riskier investment; the synthesizer inverts it.

use super::{Assessment, Qualitative, QualitativeRequest, ScoringStrategy};
use crate::error::Result;
use crate::reference::{ReferenceData, UNKNOWN_STAGE_RISK};
use deal_core::{CompanyRecord, Insight, InsightKind, RecordField, TaskKind};
use serde_json::json;

/// Runway assumed when the record does not state one
pub const DEFAULT_RUNWAY_MONTHS: f64 = 12.0;

/// Risk used when burn multiple or team size cannot be computed
pub const NEUTRAL_RISK: f64 = 5.0;

const RUNWAY_WEIGHT: f64 = 0.30;
const BURN_WEIGHT: f64 = 0.25;
const INDUSTRY_WEIGHT: f64 = 0.20;
const TEAM_WEIGHT: f64 = 0.10;
const STAGE_WEIGHT: f64 = 0.15;

const KEY_RISK_FACTORS: &str = "key_risk_factors";
const MITIGATIONS: &str = "mitigations";

fn runway_risk(months: f64) -> f64 {
    match months {
        m if m < 6.0 => 9.0,
        m if m < 12.0 => 6.0,
        m if m < 18.0 => 4.0,
        _ => 2.0,
    }
}

/// Annualised burn over revenue; `None` without both figures
fn burn_multiple(record: &CompanyRecord) -> Option<f64> {
    let burn = record.amount(RecordField::BurnRate)?;
    let revenue = record.amount(RecordField::Revenue)?;
    Some(burn * 12.0 / revenue)
}

fn burn_risk(multiple: Option<f64>) -> f64 {
    match multiple {
        None => NEUTRAL_RISK,
        Some(m) if m > 3.0 => 8.0,
        Some(m) if m > 1.5 => 5.0,
        Some(_) => 3.0,
    }
}

fn team_risk(team: Option<f64>) -> f64 {
    match team {
        None => NEUTRAL_RISK,
        Some(t) if t < 5.0 => 7.0,
        Some(t) if t < 15.0 => 4.0,
        Some(_) => 3.0,
    }
}

/// Scores risk magnitude
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskStrategy;

impl ScoringStrategy for RiskStrategy {
    const KIND: TaskKind = TaskKind::Risk;
    const INPUTS: &'static [RecordField] = &[
        RecordField::Industry,
        RecordField::Revenue,
        RecordField::BurnRate,
        RecordField::Runway,
        RecordField::TeamSize,
        RecordField::FundingStage,
    ];

    fn qualitative(&self) -> Option<QualitativeRequest> {
        Some(QualitativeRequest {
            instruction: "Identify the most material investment risks and the mitigations \
                          the company has in place or should adopt.",
            keys: &[KEY_RISK_FACTORS, MITIGATIONS],
        })
    }

    fn default_qualitative(&self, key: &str) -> Vec<String> {
        let items: &[&str] = match key {
            KEY_RISK_FACTORS => &[
                "Limited operating history",
                "Dependence on the next funding round",
            ],
            MITIGATIONS => &[
                "Stage-gated capital deployment",
                "Monthly financial reporting to the board",
            ],
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
        let stage = reference.stage(record.get(RecordField::FundingStage));

        let runway = record
            .months(RecordField::Runway)
            .unwrap_or(DEFAULT_RUNWAY_MONTHS);
        let multiple = burn_multiple(record);
        let team = record.amount(RecordField::TeamSize);

        let runway_risk = runway_risk(runway);
        let burn_risk = burn_risk(multiple);
        let team_risk = team_risk(team);
        let stage_risk = stage.map_or(UNKNOWN_STAGE_RISK, |s| s.risk);

        let score = RUNWAY_WEIGHT * runway_risk
            + BURN_WEIGHT * burn_risk
            + INDUSTRY_WEIGHT * industry.base_risk
            + TEAM_WEIGHT * team_risk
            + STAGE_WEIGHT * stage_risk;

        let mut insights = Vec::new();
        if runway < 6.0 {
            insights.push(Insight::new(
                InsightKind::Risk,
                format!("Runway of {runway:.0} months is critically short"),
                "Bridge financing or cost cuts are needed immediately",
                9,
            ));
        } else if runway < 12.0 {
            insights.push(Insight::new(
                InsightKind::Risk,
                format!("Runway of {runway:.0} months forces a raise within the year"),
                "Negotiating leverage in the next round is limited",
                7,
            ));
        } else if runway >= 18.0 {
            insights.push(Insight::new(
                InsightKind::Strength,
                format!("Runway of {runway:.0} months gives room to execute"),
                "The company can raise from a position of strength",
                5,
            ));
        }

        match multiple {
            Some(m) if m > 3.0 => insights.push(Insight::new(
                InsightKind::Risk,
                format!("Burn multiple of {m:.1}x is high"),
                "Each unit of revenue costs too much capital to acquire",
                7,
            )),
            Some(m) if m <= 1.5 => insights.push(Insight::new(
                InsightKind::Strength,
                format!("Burn multiple of {m:.1}x shows capital efficiency"),
                "Growth is not bought at any price",
                5,
            )),
            _ => {}
        }

        if let Some(regulatory) = industry.regulatory_risks.first() {
            insights.push(Insight::new(
                InsightKind::Risk,
                regulatory.clone(),
                format!("Structural exposure typical of {}", industry.label),
                5,
            ));
        }

        for factor in qualitative.get(KEY_RISK_FACTORS).iter().take(2) {
            insights.push(Insight::new(
                InsightKind::Risk,
                factor.clone(),
                "Raised during qualitative review",
                6,
            ));
        }

        Ok(Assessment {
            score,
            headline: format!("risk {score:.1}/10 with {runway:.0} months of runway"),
            insights,
            metrics: json!({
                "industry": industry.key,
                "stage": stage.map(|s| s.key.as_str()),
                "runway_months": runway,
                "runway_risk": runway_risk,
                "burn_multiple": multiple,
                "burn_risk": burn_risk,
                "industry_risk": industry.base_risk,
                "team_size": team,
                "team_risk": team_risk,
                "stage_risk": stage_risk,
                "mitigations": qualitative.get(MITIGATIONS),
            }),
        })
    }
}
