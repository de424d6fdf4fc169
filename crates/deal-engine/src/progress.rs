//! Progress reporting
//!
//! Best-effort and advisory: observers see milestones in the order the
//! orchestrator reaches them, but nothing depends on their delivery.

use deal_core::TaskKind;

/// A run milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    ExtractionStarted,
    ExtractionComplete { defaulted: bool },
    TasksLaunched { total: usize },
    TaskComplete {
        task: TaskKind,
        degraded: bool,
        completed: usize,
        total: usize,
    },
    SynthesisComplete,
}

const TASKS_LAUNCHED_PERCENT: u8 = 25;
const PER_TASK_PERCENT: usize = 15;

impl ProgressEvent {
    /// Percent complete at this milestone
    pub fn percent(&self) -> u8 {
        match self {
            Self::ExtractionStarted => 5,
            Self::ExtractionComplete { .. } => 20,
            Self::TasksLaunched { .. } => TASKS_LAUNCHED_PERCENT,
            Self::TaskComplete { completed, .. } => {
                let percent = usize::from(TASKS_LAUNCHED_PERCENT) + PER_TASK_PERCENT * completed;
                u8::try_from(percent.min(99)).unwrap_or(99)
            }
            Self::SynthesisComplete => 100,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            Self::ExtractionStarted => "Extracting company data".to_string(),
            Self::ExtractionComplete { defaulted: false } => "Company data extracted".to_string(),
            Self::ExtractionComplete { defaulted: true } => {
                "Extraction failed, using default company template".to_string()
            }
            Self::TasksLaunched { total } => format!("Running {total} analyses"),
            Self::TaskComplete {
                task,
                degraded,
                completed,
                total,
            } => {
                let suffix = if *degraded { " (degraded)" } else { "" };
                format!(
                    "{} analysis complete{suffix} [{completed}/{total}]",
                    task.label()
                )
            }
            Self::SynthesisComplete => "Report ready".to_string(),
        }
    }
}

/// Receives progress milestones
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str, u8) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(&event.message(), event.percent());
    }
}
