//! Investment analysis engine for dealscope
//!
//! This crate turns a pitch document (or a canned demo profile) into an
//! investment recommendation:
//!
//! - [`ExtractionAdapter`]: document to [`deal_core::CompanyRecord`], recovering
//!   any failure with a default template
//! - Four analysis tasks (market, risk, competitive, portfolio) built from one
//!   generic [`ScoringTask`] and a per-domain [`ScoringStrategy`]
//! - [`Orchestrator`]: runs extraction, then the four tasks concurrently,
//!   then the [`Synthesizer`]
//! - [`ReferenceData`]: benchmark, risk, exit and comparable tables loaded once
//!   and shared read-only
//!
//! # Example
//!
//! ```rust,no_run
//! use deal_engine::{AnalysisInput, DemoProfile, Orchestrator};
//!
//! # async fn example() -> deal_engine::Result<()> {
//! let orchestrator = Orchestrator::builder().build()?;
//! let progress = |message: &str, percent: u8| println!("[{percent:>3}%] {message}");
//!
//! let bundle = orchestrator
//!     .analyze(&AnalysisInput::Demo(DemoProfile::Agritech), Some(&progress))
//!     .await?;
//! println!("{}: {}", bundle.report.tier, bundle.report.executive_summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extraction;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod reference;
pub mod synthesizer;
pub mod tasks;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{EngineError, Result};
pub use extraction::{AnalysisInput, DemoProfile, Extraction, ExtractionAdapter, default_record};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunPhase, RunStatus};
pub use progress::{ProgressEvent, ProgressObserver};
pub use reference::ReferenceData;
pub use synthesizer::{Synthesizer, weighted_score};
pub use tasks::{
    CompetitiveStrategy, MarketStrategy, PortfolioStrategy, RiskStrategy, ScoringStrategy,
    ScoringTask, default_tasks,
};

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use deal_llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider};
    use mockall::mock;

    mock! {
        pub Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(&self, request: CompletionRequest) -> deal_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    /// Provider that answers every request with `text`
    pub(crate) fn scripted_provider(text: &str) -> MockProvider {
        let text = text.to_string();
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .returning(move |_| Ok(CompletionResponse::text(text.clone())));
        provider.expect_name().return_const("mock".to_string());
        provider
    }

    /// Provider that fails every request
    pub(crate) fn failing_provider(
        error: impl Fn() -> LLMError + Send + 'static,
    ) -> MockProvider {
        let mut provider = MockProvider::new();
        provider.expect_complete().returning(move |_| Err(error()));
        provider.expect_name().return_const("mock".to_string());
        provider
    }
}
