use crate::model::StepOutcome;
use async_trait::async_trait;

/// A unit of work the orchestrator can invoke once per run.
///
/// Implementations report failures through the returned outcome and never
/// panic or return errors into the orchestrator.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// What the journal shows next to the name when the step starts.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    async fn invoke(&self) -> StepOutcome;
}
