pub mod config;
pub mod error;
pub mod executor;
pub mod log;
pub mod model;
pub mod notify;
pub mod pipeline;

pub use error::{OrchestratorError, Result};
pub use executor::{Orchestrator, Phase, ProcessStep, Step};
pub use model::{PipelineSpec, RunSummary, StepOutcome, StepRecord};
