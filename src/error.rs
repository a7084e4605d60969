use std::path::PathBuf;
use thiserror::Error;

/// Faults of the orchestrator itself. Step failures are never reported
/// through this type; they are recorded as `StepOutcome::Failed`.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Cannot create log directory {path}: {source}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write log file {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot load variables from {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Cannot write run summary {path}: {source}")]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read pipeline file {path}: {source}")]
    PipelineRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pipeline declaration: {0}")]
    PipelineParse(#[from] serde_json::Error),

    #[error("Invalid wait '{value}' in phase {phase}: {source}")]
    InvalidDelay {
        phase: String,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Step name declared more than once: {0}")]
    DuplicateStep(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
