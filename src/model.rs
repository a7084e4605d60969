use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Declarative form of a whole pipeline, as shipped in code or loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub name: String,
    /// Heading used in the operator notification.
    pub title: String,
    /// Daily log files are named `<log_prefix>_<YYYYMMDD>.log`.
    pub log_prefix: String,
    pub phases: Vec<PhaseSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub id: String,
    pub description: String,
    pub steps: Vec<StepSpec>,
    #[serde(default, rename = "abortOnFailure")]
    pub abort_on_failure: bool,
    /// Independent phases run even after an earlier phase aborted the chain.
    #[serde(default)]
    pub independent: bool,
    /// Pre-phase delay in humantime notation, e.g. `"5m"`.
    #[serde(default)]
    pub wait: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    /// Script path, relative to the base directory unless absolute.
    pub script: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded {
        stdout: String,
    },
    Failed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    Skipped,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    /// A failure that never reached an exit status, e.g. a missing script.
    pub fn not_started(reason: impl Into<String>) -> Self {
        StepOutcome::Failed {
            exit_code: None,
            stdout: String::new(),
            stderr: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcome,
}

impl StepRecord {
    pub fn new(name: impl Into<String>, outcome: StepOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    pub fn skipped(name: impl Into<String>) -> Self {
        Self::new(name, StepOutcome::Skipped)
    }
}

/// Outcome of one orchestrator run: one record per declared step, in
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub records: Vec<StepRecord>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Local>, records: Vec<StepRecord>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Local::now(),
            records,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.names_where(|o| matches!(o, StepOutcome::Succeeded { .. }))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.names_where(|o| matches!(o, StepOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names_where(|o| matches!(o, StepOutcome::Skipped))
    }

    /// True when nothing failed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.records.iter().all(|r| r.outcome.is_success())
    }

    pub fn outcome_of(&self, name: &str) -> Option<&StepOutcome> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }

    fn names_where(&self, pred: impl Fn(&StepOutcome) -> bool) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| pred(&r.outcome))
            .map(|r| r.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests;
