//! Orchestrator: one extraction, four concurrent tasks, one synthesis
//!
//! Each run owns its record, outcomes and status; nothing is shared across
//! runs. Tasks run on their own tokio tasks against a shared read-only
//! record, so a panicking task is isolated like a failing one.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::extraction::{AnalysisInput, ExtractionAdapter};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::reference::ReferenceData;
use crate::synthesizer::Synthesizer;
use crate::tasks::default_tasks;
use deal_core::{AnalysisOutcome, AnalysisTask, ReportBundle, TaskKind};
use deal_llm::LLMProvider;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    ExtractionInFlight,
    TasksInFlight,
    Joined,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ExtractionInFlight => "extraction_in_flight",
            Self::TasksInFlight => "tasks_in_flight",
            Self::Joined => "joined",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-run status, written only by the orchestrator
#[derive(Debug, Clone)]
pub struct RunStatus {
    run_id: Uuid,
    phase: RunPhase,
    completed: Vec<TaskKind>,
}

impl RunStatus {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase: RunPhase::Idle,
            completed: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Tasks finished so far, in completion order
    pub fn completed(&self) -> &[TaskKind] {
        &self.completed
    }

    fn advance(&mut self, phase: RunPhase) {
        info!(from = %self.phase, to = %phase, "Run phase transition");
        self.phase = phase;
    }
}

/// Drives analysis runs
pub struct Orchestrator {
    adapter: ExtractionAdapter,
    tasks: Vec<Arc<dyn AnalysisTask>>,
    synthesizer: Synthesizer,
    fallback_confidence: f64,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("adapter", &self.adapter)
            .field("tasks", &self.task_kinds())
            .finish()
    }
}

impl Orchestrator {
    /// Create a new orchestrator builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Task kinds in canonical order
    pub fn task_kinds(&self) -> Vec<TaskKind> {
        self.tasks.iter().map(|t| t.kind()).collect()
    }

    pub fn is_online(&self) -> bool {
        self.adapter.is_online()
    }

    /// Run one analysis
    ///
    /// Completes with a report unless the outcome set breaks the synthesis
    /// contract. Progress milestones go to `observer` on a best-effort basis.
    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<ReportBundle> {
        let status = RunStatus::new();
        let span = info_span!("analysis_run", run_id = %status.run_id);
        self.run(status, input, observer).instrument(span).await
    }

    async fn run(
        &self,
        mut status: RunStatus,
        input: &AnalysisInput,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<ReportBundle> {
        let notify = |event: ProgressEvent| {
            if let Some(observer) = observer {
                observer.on_progress(&event);
            }
        };

        status.advance(RunPhase::ExtractionInFlight);
        notify(ProgressEvent::ExtractionStarted);
        let extraction = self.adapter.extract(input).await;
        notify(ProgressEvent::ExtractionComplete {
            defaulted: extraction.is_defaulted(),
        });

        let (record, source) = extraction.into_parts();
        let record = Arc::new(record);
        let total = self.tasks.len();

        status.advance(RunPhase::TasksInFlight);
        notify(ProgressEvent::TasksLaunched { total });

        let mut pending: FuturesUnordered<_> = self
            .tasks
            .iter()
            .map(|task| {
                let task = Arc::clone(task);
                let record = Arc::clone(&record);
                let kind = task.kind();
                let span = info_span!("analysis_task", task = %kind);
                let handle = tokio::spawn(async move { task.run(&record).await }.instrument(span));
                async move { (kind, handle.await) }
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);
        while let Some((kind, joined)) = pending.next().await {
            let outcome = joined.unwrap_or_else(|err| {
                let reason = join_failure(err);
                warn!(task = %kind, reason = %reason, "Task aborted, substituting fallback outcome");
                AnalysisOutcome::fallback(kind, self.fallback_confidence, reason)
            });

            status.completed.push(kind);
            notify(ProgressEvent::TaskComplete {
                task: kind,
                degraded: outcome.is_fallback(),
                completed: status.completed.len(),
                total,
            });
            outcomes.push(outcome);
        }

        status.advance(RunPhase::Joined);
        outcomes.sort_by_key(|o| o.task);
        let report = self.synthesizer.synthesize(&record, &source, &outcomes)?;

        status.advance(RunPhase::Done);
        info!(
            score = report.weighted_score,
            tier = %report.tier,
            degraded = report.degraded_tasks().len(),
            "Analysis complete"
        );
        notify(ProgressEvent::SynthesisComplete);

        let record = Arc::try_unwrap(record).unwrap_or_else(|shared| (*shared).clone());
        Ok(ReportBundle {
            run_id: status.run_id,
            record,
            source,
            outcomes,
            report,
        })
    }
}

/// Describe why a spawned task produced no outcome
fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return "task was cancelled".to_string();
    }
    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("task panicked: {detail}")
}

/// Builder for [`Orchestrator`]
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: EngineConfig,
    provider: Option<Arc<dyn LLMProvider>>,
    reference: Option<Arc<ReferenceData>>,
    overrides: Vec<Arc<dyn AnalysisTask>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the generative-text provider; without one the run is offline
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the reference tables; defaults to the built-in set
    pub fn reference(mut self, reference: Arc<ReferenceData>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Replace the standard task of the same kind
    pub fn task(mut self, task: Arc<dyn AnalysisTask>) -> Self {
        self.overrides.push(task);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or reference data is invalid,
    /// or if two replacement tasks share a kind.
    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;
        let reference = match self.reference {
            Some(reference) => {
                reference.validate()?;
                reference
            }
            None => Arc::new(ReferenceData::builtin()),
        };

        let fallback_confidence = self.config.fallback_confidence;
        let config = Arc::new(self.config);
        let adapter = match self.provider {
            Some(provider) => ExtractionAdapter::new(provider, config),
            None => ExtractionAdapter::offline(config),
        };

        let mut tasks = default_tasks(&adapter, &reference);
        for (i, task) in self.overrides.iter().enumerate() {
            let kind = task.kind();
            if self.overrides[..i].iter().any(|t| t.kind() == kind) {
                return Err(EngineError::Contract(
                    deal_core::Error::SynthesisInputInvalid(format!(
                        "more than one {kind} task configured"
                    )),
                ));
            }
            tasks.retain(|t| t.kind() != kind);
            tasks.push(Arc::clone(task));
        }
        tasks.sort_by_key(|t| t.kind());

        Ok(Orchestrator {
            adapter,
            tasks,
            synthesizer: Synthesizer::new(),
            fallback_confidence,
        })
    }
}
