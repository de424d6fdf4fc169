//! Core data model for dealscope
//!
//! This crate defines the types shared by every stage of an analysis run:
//! the extracted [`CompanyRecord`], the per-task [`AnalysisOutcome`], the
//! final [`SynthesizedReport`], and the [`AnalysisTask`] contract the four
//! scoring tasks implement. It also hosts the lenient numeric parser every
//! task uses to read free-form figures.

pub mod error;
pub mod magnitude;
pub mod outcome;
pub mod record;
pub mod report;
pub mod task;

pub use error::{Error, Result};
pub use magnitude::{parse_magnitude, parse_months, parse_percent};
pub use outcome::{
    AnalysisOutcome, FALLBACK_SCORE, Insight, InsightKind, OutcomeStatus, SCORE_RANGE, TaskKind,
};
pub use record::{CompanyRecord, RecordField};
pub use report::{
    PROCEED_THRESHOLD, RecommendationTier, RecordSource, ReportBundle, STRONG_BUY_THRESHOLD,
    SynthesizedReport, TaskScore,
};
pub use task::AnalysisTask;
