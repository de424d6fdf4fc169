//! Static reference tables used by the scoring tasks
//!
//! Benchmarks, industry risk profiles, exit multiples, comparable companies
//! and portfolio allocation targets. Loaded once at start-up (built-in or
//! from JSON) and shared read-only as `Arc<ReferenceData>`.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Percentile reported when a distribution is degenerate
pub const NEUTRAL_PERCENTILE: f64 = 50.0;

/// Stage risk when the funding stage is missing or unrecognised
pub const UNKNOWN_STAGE_RISK: f64 = 6.0;

/// Ownership retained to exit when the funding stage is missing or unrecognised
pub const UNKNOWN_STAGE_RETENTION: f64 = 0.65;

/// First, second and third quartile of a benchmark distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

impl Quartiles {
    pub const fn new(p25: f64, median: f64, p75: f64) -> Self {
        Self { p25, median, p75 }
    }

    fn is_well_formed(&self) -> bool {
        self.p25 > 0.0 && self.median > self.p25 && self.p75 > self.median && self.p75.is_finite()
    }

    /// Piecewise-linear percentile of `value` within this distribution
    ///
    /// Degenerate quartiles or a non-finite value yield
    /// [`NEUTRAL_PERCENTILE`]. The result stays in `[0, 99]`.
    pub fn percentile(&self, value: f64) -> f64 {
        if !self.is_well_formed() || !value.is_finite() {
            return NEUTRAL_PERCENTILE;
        }

        let Self { p25, median, p75 } = *self;
        let percentile = if value <= 0.0 {
            0.0
        } else if value < p25 {
            25.0 * value / p25
        } else if value < median {
            25.0 + 25.0 * (value - p25) / (median - p25)
        } else if value < p75 {
            50.0 + 25.0 * (value - median) / (p75 - median)
        } else {
            75.0 + 25.0 * (1.0 - p75 / value)
        };

        percentile.clamp(0.0, 99.0)
    }
}

/// Share of `values` strictly below `value`, as a percentage
///
/// An empty set yields [`NEUTRAL_PERCENTILE`].
pub fn rank_among(value: f64, values: impl IntoIterator<Item = f64>) -> f64 {
    let (below, total) = values
        .into_iter()
        .fold((0_usize, 0_usize), |(below, total), v| {
            (below + usize::from(v < value), total + 1)
        });

    if total == 0 || !value.is_finite() {
        return NEUTRAL_PERCENTILE;
    }
    100.0 * below as f64 / total as f64
}

/// A comparable company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
    pub name: String,
    pub revenue: f64,
    pub growth_pct: f64,
    pub valuation: f64,
}

impl Comparable {
    fn new(name: &str, revenue: f64, growth_pct: f64, valuation: f64) -> Self {
        Self {
            name: name.to_string(),
            revenue,
            growth_pct,
            valuation,
        }
    }

    /// Valuation over revenue; `None` when revenue is zero
    pub fn revenue_multiple(&self) -> Option<f64> {
        (self.revenue > 0.0).then(|| self.valuation / self.revenue)
    }
}

/// Current and target portfolio share of an industry, both in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub current: f64,
    pub target: f64,
}

/// Everything the tasks know about one industry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryProfile {
    pub key: String,
    pub label: String,
    /// Word prefixes that identify the industry in free text
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Annual revenue benchmark
    pub revenue: Quartiles,
    /// Annual growth benchmark, in percent
    pub growth: Quartiles,
    /// Default addressable market size
    pub market_size: f64,
    /// Industry base risk on a 1-10 scale
    pub base_risk: f64,
    pub regulatory_risks: Vec<String>,
    /// Exit value as a multiple of revenue
    pub exit_multiple: f64,
    pub comparables: Vec<Comparable>,
    pub allocation: Allocation,
}

impl IndustryProfile {
    fn matches(&self, words: &[String]) -> bool {
        std::iter::once(&self.key)
            .chain(self.aliases.iter())
            .any(|alias| words.iter().any(|w| w.starts_with(alias.as_str())))
    }

    /// Median revenue multiple across comparables
    pub fn comparable_multiple(&self) -> Option<f64> {
        let mut multiples: Vec<f64> = self
            .comparables
            .iter()
            .filter_map(Comparable::revenue_multiple)
            .collect();
        if multiples.is_empty() {
            return None;
        }
        multiples.sort_by(f64::total_cmp);
        Some(multiples[multiples.len() / 2])
    }
}

/// Funding stage profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    pub key: String,
    /// Phrases matched against the normalised stage text
    pub aliases: Vec<String>,
    /// Stage risk on a 1-10 scale
    pub risk: f64,
    /// Fraction of entry ownership still held at exit
    pub retention: f64,
}

/// Versioned reference tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub version: String,
    /// Used when no specific industry matches
    pub default_industry: IndustryProfile,
    /// Checked in order; first match wins
    pub industries: Vec<IndustryProfile>,
    /// Checked in order; first match wins
    pub stages: Vec<StageProfile>,
}

/// Lowercase alphanumeric words of a free-form label
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl ReferenceData {
    /// Parse and validate reference data from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(EngineError::Reference("version must not be empty".to_string()));
        }

        for profile in std::iter::once(&self.default_industry).chain(&self.industries) {
            if !profile.revenue.is_well_formed() || !profile.growth.is_well_formed() {
                return Err(EngineError::Reference(format!(
                    "{}: quartiles must be positive and strictly increasing",
                    profile.key
                )));
            }
            if !(1.0..=10.0).contains(&profile.base_risk) {
                return Err(EngineError::Reference(format!(
                    "{}: base_risk must be within [1, 10]",
                    profile.key
                )));
            }
            if !(profile.exit_multiple.is_finite() && profile.exit_multiple > 0.0)
                || !(profile.market_size.is_finite() && profile.market_size > 0.0)
            {
                return Err(EngineError::Reference(format!(
                    "{}: exit_multiple and market_size must be positive and finite",
                    profile.key
                )));
            }
            let Allocation { current, target } = profile.allocation;
            if !(0.0..=1.0).contains(&current) || !(0.0..=1.0).contains(&target) {
                return Err(EngineError::Reference(format!(
                    "{}: allocation shares must be within [0, 1]",
                    profile.key
                )));
            }
            if let Some(comp) = profile.comparables.iter().find(|c| {
                !(c.revenue.is_finite() && c.revenue > 0.0)
                    || !c.growth_pct.is_finite()
                    || !(c.valuation.is_finite() && c.valuation >= 0.0)
            }) {
                return Err(EngineError::Reference(format!(
                    "{}: comparable {} needs positive revenue and finite figures",
                    profile.key, comp.name
                )));
            }
        }

        for stage in &self.stages {
            if !(1.0..=10.0).contains(&stage.risk) {
                return Err(EngineError::Reference(format!(
                    "{}: risk must be within [1, 10]",
                    stage.key
                )));
            }
            if !(stage.retention > 0.0 && stage.retention <= 1.0) {
                return Err(EngineError::Reference(format!(
                    "{}: retention must be within (0, 1]",
                    stage.key
                )));
            }
        }

        Ok(())
    }

    /// Profile for a free-form industry label, falling back to the default
    pub fn industry(&self, label: Option<&str>) -> &IndustryProfile {
        let Some(label) = label else {
            return &self.default_industry;
        };
        let words = words(label);
        self.industries
            .iter()
            .find(|p| p.matches(&words))
            .unwrap_or(&self.default_industry)
    }

    /// Profile for a free-form funding stage, if recognised
    pub fn stage(&self, label: Option<&str>) -> Option<&StageProfile> {
        let normalized = words(label?).join(" ");
        self.stages.iter().find(|stage| {
            stage
                .aliases
                .iter()
                .any(|alias| normalized.contains(alias.as_str()))
        })
    }

    /// Built-in tables (amounts in INR)
    pub fn builtin() -> Self {
        Self {
            version: "2024.1".to_string(),
            default_industry: IndustryProfile {
                key: "technology".to_string(),
                label: "Technology".to_string(),
                aliases: Vec::new(),
                revenue: Quartiles::new(5.0e5, 2.0e6, 1.0e7),
                growth: Quartiles::new(10.0, 20.0, 40.0),
                market_size: 5.0e10,
                base_risk: 5.0,
                regulatory_risks: strings(&[
                    "Execution risk at early scale",
                    "Talent retention in a competitive hiring market",
                ]),
                exit_multiple: 10.0,
                comparables: vec![
                    Comparable::new("Nimbus Labs", 5.0e5, 60.0, 1.0e7),
                    Comparable::new("Quarry Systems", 1.2e6, 35.0, 1.5e7),
                    Comparable::new("Tessel Works", 3.0e6, 22.0, 3.0e7),
                    Comparable::new("Brightline Digital", 9.0e6, 18.0, 8.0e7),
                    Comparable::new("Corvid Tech", 2.5e7, 12.0, 2.0e8),
                ],
                allocation: Allocation {
                    current: 0.20,
                    target: 0.25,
                },
            },
            industries: vec![
                IndustryProfile {
                    key: "agritech".to_string(),
                    label: "Agritech".to_string(),
                    aliases: strings(&["agri", "agro", "farm", "crop", "dairy"]),
                    revenue: Quartiles::new(4.0e5, 1.5e6, 8.0e6),
                    growth: Quartiles::new(10.0, 25.0, 50.0),
                    market_size: 2.4e11,
                    base_risk: 6.0,
                    regulatory_risks: strings(&[
                        "Monsoon and crop-cycle dependence",
                        "State-level agricultural marketing regulation",
                    ]),
                    exit_multiple: 6.0,
                    comparables: vec![
                        Comparable::new("Harvest Grid", 6.0e5, 40.0, 6.0e6),
                        Comparable::new("Mandi Connect", 2.0e6, 30.0, 1.6e7),
                        Comparable::new("SoilSense", 4.5e6, 20.0, 3.2e7),
                        Comparable::new("AgroBridge", 1.2e7, 15.0, 7.0e7),
                    ],
                    allocation: Allocation {
                        current: 0.10,
                        target: 0.20,
                    },
                },
                IndustryProfile {
                    key: "fintech".to_string(),
                    label: "Fintech".to_string(),
                    aliases: strings(&[
                        "fin", "payment", "lending", "bank", "insur", "credit", "neobank",
                    ]),
                    revenue: Quartiles::new(1.0e6, 5.0e6, 2.5e7),
                    growth: Quartiles::new(15.0, 35.0, 70.0),
                    market_size: 1.0e12,
                    base_risk: 7.0,
                    regulatory_risks: strings(&[
                        "Central bank licensing and compliance burden",
                        "Credit losses in lending books",
                    ]),
                    exit_multiple: 10.0,
                    comparables: vec![
                        Comparable::new("Ledgerly", 1.5e6, 55.0, 2.0e7),
                        Comparable::new("PayNest", 6.0e6, 40.0, 7.0e7),
                        Comparable::new("Kreditt", 1.8e7, 28.0, 1.9e8),
                        Comparable::new("UPIFlow", 4.0e7, 20.0, 4.5e8),
                    ],
                    allocation: Allocation {
                        current: 0.30,
                        target: 0.25,
                    },
                },
                IndustryProfile {
                    key: "healthtech".to_string(),
                    label: "Healthtech".to_string(),
                    aliases: strings(&["health", "medical", "pharma", "diagnos", "clinic"]),
                    revenue: Quartiles::new(8.0e5, 3.0e6, 1.5e7),
                    growth: Quartiles::new(12.0, 30.0, 60.0),
                    market_size: 5.0e11,
                    base_risk: 6.0,
                    regulatory_risks: strings(&[
                        "Clinical validation and approval timelines",
                        "Health data privacy obligations",
                    ]),
                    exit_multiple: 8.0,
                    comparables: vec![
                        Comparable::new("CareLoop", 1.0e6, 45.0, 1.2e7),
                        Comparable::new("Vitalis Health", 3.5e6, 32.0, 3.0e7),
                        Comparable::new("DiagNow", 1.1e7, 24.0, 8.5e7),
                    ],
                    allocation: Allocation {
                        current: 0.15,
                        target: 0.15,
                    },
                },
                IndustryProfile {
                    key: "edtech".to_string(),
                    label: "Edtech".to_string(),
                    aliases: strings(&["edu", "learning", "school", "tutor", "skill"]),
                    revenue: Quartiles::new(6.0e5, 2.5e6, 1.2e7),
                    growth: Quartiles::new(8.0, 20.0, 45.0),
                    market_size: 3.0e11,
                    base_risk: 7.0,
                    regulatory_risks: strings(&[
                        "Post-pandemic demand normalisation",
                        "High customer acquisition cost",
                    ]),
                    exit_multiple: 5.0,
                    comparables: vec![
                        Comparable::new("Shiksha Labs", 8.0e5, 30.0, 6.0e6),
                        Comparable::new("SkillForge", 3.0e6, 18.0, 1.8e7),
                        Comparable::new("ClassPilot", 9.0e6, 12.0, 4.0e7),
                    ],
                    allocation: Allocation {
                        current: 0.10,
                        target: 0.05,
                    },
                },
                IndustryProfile {
                    key: "cleantech".to_string(),
                    label: "Cleantech".to_string(),
                    aliases: strings(&[
                        "clean", "energy", "solar", "climate", "carbon", "electric", "renewable",
                    ]),
                    revenue: Quartiles::new(5.0e5, 2.0e6, 1.0e7),
                    growth: Quartiles::new(15.0, 35.0, 80.0),
                    market_size: 6.0e11,
                    base_risk: 6.0,
                    regulatory_risks: strings(&[
                        "Capital intensity of hardware deployment",
                        "Dependence on subsidy and policy incentives",
                    ]),
                    exit_multiple: 9.0,
                    comparables: vec![
                        Comparable::new("SunGrid", 7.0e5, 70.0, 1.2e7),
                        Comparable::new("VoltTrail", 2.5e6, 45.0, 3.0e7),
                        Comparable::new("CarbonLedger", 6.0e6, 30.0, 6.0e7),
                        Comparable::new("GreenArc Energy", 2.0e7, 22.0, 1.8e8),
                    ],
                    allocation: Allocation {
                        current: 0.05,
                        target: 0.15,
                    },
                },
                IndustryProfile {
                    key: "saas".to_string(),
                    label: "SaaS".to_string(),
                    aliases: strings(&["software", "cloud", "platform"]),
                    revenue: Quartiles::new(1.0e6, 6.0e6, 3.0e7),
                    growth: Quartiles::new(20.0, 45.0, 90.0),
                    market_size: 8.0e11,
                    base_risk: 5.0,
                    regulatory_risks: strings(&[
                        "Churn among small-business customers",
                        "Global competition from well-funded incumbents",
                    ]),
                    exit_multiple: 12.0,
                    comparables: vec![
                        Comparable::new("Stackwise", 2.0e6, 70.0, 3.0e7),
                        Comparable::new("Opsly", 8.0e6, 50.0, 1.1e8),
                        Comparable::new("Formbase", 2.4e7, 35.0, 3.0e8),
                    ],
                    allocation: Allocation {
                        current: 0.20,
                        target: 0.15,
                    },
                },
            ],
            stages: vec![
                stage("pre-seed", &["pre seed", "preseed", "angel", "bootstrap"], 8.0, 0.55),
                stage("series-b-plus", &["series b", "series c", "series d", "late stage", "pre ipo"], 3.0, 0.80),
                stage("series-a", &["series a", "pre series a"], 5.0, 0.70),
                stage("seed", &["seed"], 7.0, 0.60),
            ],
        }
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn stage(key: &str, aliases: &[&str], risk: f64, retention: f64) -> StageProfile {
    StageProfile {
        key: key.to_string(),
        aliases: strings(aliases),
        risk,
        retention,
    }
}
