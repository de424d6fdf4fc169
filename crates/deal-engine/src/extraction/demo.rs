//! Canned demo companies

use deal_core::{CompanyRecord, RecordField};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A canned company profile that skips document extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoProfile {
    Agritech,
    Fintech,
    Cleantech,
}

impl DemoProfile {
    pub const ALL: [DemoProfile; 3] = [Self::Agritech, Self::Fintech, Self::Cleantech];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Agritech => "agritech",
            Self::Fintech => "fintech",
            Self::Cleantech => "cleantech",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            Self::Agritech => "KrishiLink: seed-stage farm-to-market supply chain, Pune",
            Self::Fintech => "PayVeda: Series A SME payments and credit, Bengaluru",
            Self::Cleantech => "SolarNest: seed-stage rooftop solar financing, Jaipur",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// The canned record
    pub fn record(&self) -> CompanyRecord {
        let fields: [(RecordField, &str); 13] = match self {
            Self::Agritech => [
                (RecordField::Name, "KrishiLink"),
                (RecordField::Industry, "Agritech"),
                (RecordField::Location, "Pune, India"),
                (RecordField::FoundedYear, "2020"),
                (RecordField::Revenue, "₹85L"),
                (RecordField::BurnRate, "₹12L per month"),
                (RecordField::Runway, "14 months"),
                (RecordField::FundingAmount, "₹3Cr"),
                (RecordField::FundingStage, "Seed"),
                (RecordField::Valuation, "₹18Cr"),
                (RecordField::TeamSize, "18"),
                (RecordField::GrowthRate, "40%"),
                (RecordField::MarketSize, "₹24,000Cr"),
            ],
            Self::Fintech => [
                (RecordField::Name, "PayVeda"),
                (RecordField::Industry, "Fintech"),
                (RecordField::Location, "Bengaluru, India"),
                (RecordField::FoundedYear, "2019"),
                (RecordField::Revenue, "₹4.2Cr"),
                (RecordField::BurnRate, "₹35L per month"),
                (RecordField::Runway, "18 months"),
                (RecordField::FundingAmount, "₹25Cr"),
                (RecordField::FundingStage, "Series A"),
                (RecordField::Valuation, "₹120Cr"),
                (RecordField::TeamSize, "45"),
                (RecordField::GrowthRate, "60%"),
                (RecordField::MarketSize, "$12B"),
            ],
            Self::Cleantech => [
                (RecordField::Name, "SolarNest"),
                (RecordField::Industry, "Cleantech"),
                (RecordField::Location, "Jaipur, India"),
                (RecordField::FoundedYear, "2021"),
                (RecordField::Revenue, "₹60L"),
                (RecordField::BurnRate, "₹15L per month"),
                (RecordField::Runway, "10 months"),
                (RecordField::FundingAmount, "₹5Cr"),
                (RecordField::FundingStage, "Seed"),
                (RecordField::Valuation, "₹30Cr"),
                (RecordField::TeamSize, "20"),
                (RecordField::GrowthRate, "30%"),
                (RecordField::MarketSize, "₹50,000Cr"),
            ],
        };

        fields
            .into_iter()
            .fold(CompanyRecord::new(), |record, (field, value)| {
                record.with(field, value)
            })
    }
}

impl fmt::Display for DemoProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
            format!("unknown demo profile '{s}' (expected one of: {})", known.join(", "))
        })
    }
}
