//! Structured company attributes extracted from an investment document

use crate::magnitude::{parse_magnitude, parse_months, parse_percent};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Attributes a company record can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    Name,
    Industry,
    Location,
    FoundedYear,
    Revenue,
    BurnRate,
    Runway,
    FundingAmount,
    FundingStage,
    Valuation,
    TeamSize,
    GrowthRate,
    MarketSize,
}

impl RecordField {
    /// Every field, in display order
    pub const ALL: [RecordField; 13] = [
        Self::Name,
        Self::Industry,
        Self::Location,
        Self::FoundedYear,
        Self::Revenue,
        Self::BurnRate,
        Self::Runway,
        Self::FundingAmount,
        Self::FundingStage,
        Self::Valuation,
        Self::TeamSize,
        Self::GrowthRate,
        Self::MarketSize,
    ];

    /// camelCase key used in structured payloads
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Industry => "industry",
            Self::Location => "location",
            Self::FoundedYear => "foundedYear",
            Self::Revenue => "revenue",
            Self::BurnRate => "burnRate",
            Self::Runway => "runway",
            Self::FundingAmount => "fundingAmount",
            Self::FundingStage => "fundingStage",
            Self::Valuation => "valuation",
            Self::TeamSize => "teamSize",
            Self::GrowthRate => "growthRate",
            Self::MarketSize => "marketSize",
        }
    }

    /// Alternative keys accepted when reading payloads, in priority order
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Name => &["company_name", "companyName"],
            Self::Industry => &["sector"],
            Self::Location => &["headquarters"],
            Self::FoundedYear => &["founded_year", "founded"],
            Self::Revenue => &["annual_revenue"],
            Self::BurnRate => &["burn_rate", "monthly_burn"],
            Self::Runway => &[],
            Self::FundingAmount => &["funding_amount", "funding_ask"],
            Self::FundingStage => &["funding_stage", "stage"],
            Self::Valuation => &[],
            Self::TeamSize => &["team_size", "employees"],
            Self::GrowthRate => &["growth_rate", "growth"],
            Self::MarketSize => &["market_size", "tam"],
        }
    }
}

/// Company attributes as extracted from a document
///
/// Every field is an optional free-form string. Numeric views
/// ([`CompanyRecord::amount`], [`CompanyRecord::percent`],
/// [`CompanyRecord::months`]) go through the lenient parsers and never fail.
/// The record is built once per run and shared read-only by all tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub founded_year: Option<String>,
    pub revenue: Option<String>,
    pub burn_rate: Option<String>,
    pub runway: Option<String>,
    pub funding_amount: Option<String>,
    pub funding_stage: Option<String>,
    pub valuation: Option<String>,
    pub team_size: Option<String>,
    pub growth_rate: Option<String>,
    pub market_size: Option<String>,
}

/// Strings, numbers and booleans become values; null and blank strings are absent
fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl CompanyRecord {
    /// Build a record from a loosely keyed payload
    ///
    /// For each field the canonical key is read first, then its aliases in
    /// order; the first non-empty value wins. Unknown keys are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        RecordField::ALL
            .iter()
            .fold(Self::default(), |record, field| {
                let value = std::iter::once(field.key())
                    .chain(field.aliases().iter().copied())
                    .filter_map(|key| map.get(key))
                    .find_map(lenient_string);
                match value {
                    Some(value) => record.with(*field, value),
                    None => record,
                }
            })
    }
}

impl<'de> Deserialize<'de> for CompanyRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

impl CompanyRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw string value of a field
    pub fn get(&self, field: RecordField) -> Option<&str> {
        let value = match field {
            RecordField::Name => &self.name,
            RecordField::Industry => &self.industry,
            RecordField::Location => &self.location,
            RecordField::FoundedYear => &self.founded_year,
            RecordField::Revenue => &self.revenue,
            RecordField::BurnRate => &self.burn_rate,
            RecordField::Runway => &self.runway,
            RecordField::FundingAmount => &self.funding_amount,
            RecordField::FundingStage => &self.funding_stage,
            RecordField::Valuation => &self.valuation,
            RecordField::TeamSize => &self.team_size,
            RecordField::GrowthRate => &self.growth_rate,
            RecordField::MarketSize => &self.market_size,
        };
        value.as_deref()
    }

    /// Set a field, returning the updated record
    pub fn with(mut self, field: RecordField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            RecordField::Name => self.name = value,
            RecordField::Industry => self.industry = value,
            RecordField::Location => self.location = value,
            RecordField::FoundedYear => self.founded_year = value,
            RecordField::Revenue => self.revenue = value,
            RecordField::BurnRate => self.burn_rate = value,
            RecordField::Runway => self.runway = value,
            RecordField::FundingAmount => self.funding_amount = value,
            RecordField::FundingStage => self.funding_stage = value,
            RecordField::Valuation => self.valuation = value,
            RecordField::TeamSize => self.team_size = value,
            RecordField::GrowthRate => self.growth_rate = value,
            RecordField::MarketSize => self.market_size = value,
        }
        self
    }

    /// Whether a field is present
    pub fn has(&self, field: RecordField) -> bool {
        self.get(field).is_some()
    }

    /// Number of populated fields
    pub fn populated(&self) -> usize {
        RecordField::ALL.iter().filter(|f| self.has(**f)).count()
    }

    /// Whether no field is populated
    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    /// Parsed magnitude of a field; `None` when absent or unparseable
    pub fn amount(&self, field: RecordField) -> Option<f64> {
        self.get(field)
            .map(parse_magnitude)
            .filter(|v| *v > 0.0)
    }

    /// Parsed percentage of a field; `None` when absent or unparseable
    pub fn percent(&self, field: RecordField) -> Option<f64> {
        self.get(field).map(parse_percent).filter(|v| *v > 0.0)
    }

    /// Parsed duration in months; `None` when absent or unparseable
    pub fn months(&self, field: RecordField) -> Option<f64> {
        self.get(field).map(parse_months).filter(|v| *v > 0.0)
    }

    /// Fraction of the given fields that are present, in `[0, 1]`
    pub fn completeness(&self, fields: &[RecordField]) -> f64 {
        if fields.is_empty() {
            return 0.0;
        }
        let present = fields.iter().filter(|f| self.has(**f)).count();
        present as f64 / fields.len() as f64
    }

    /// Company name for display
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed company")
    }
}
