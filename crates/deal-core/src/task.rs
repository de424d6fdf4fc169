//! Analysis task contract

use crate::{AnalysisOutcome, CompanyRecord, TaskKind};
use async_trait::async_trait;

/// Contract every analysis task implements
///
/// `run` is infallible by signature: a task converts its own failures into
/// a fallback [`AnalysisOutcome`] so one task can never block or corrupt
/// another. Tasks only read the shared record.
#[async_trait]
pub trait AnalysisTask: Send + Sync {
    /// Which of the four tasks this is
    fn kind(&self) -> TaskKind;

    /// Analyze the record
    async fn run(&self, record: &CompanyRecord) -> AnalysisOutcome;

    /// Name for logs
    fn name(&self) -> &str {
        self.kind().id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantTask(TaskKind);

    #[async_trait]
    impl AnalysisTask for ConstantTask {
        fn kind(&self) -> TaskKind {
            self.0
        }

        async fn run(&self, _record: &CompanyRecord) -> AnalysisOutcome {
            AnalysisOutcome::new(self.0, 7.0, 80.0)
        }
    }

    #[tokio::test]
    async fn test_default_name() {
        let task = ConstantTask(TaskKind::Competitive);
        assert_eq!(task.name(), "competitive-analysis");

        let outcome = task.run(&CompanyRecord::new()).await;
        assert_eq!(outcome.task, TaskKind::Competitive);
        assert_eq!(outcome.score, 7.0);
    }
}
