pub mod driver;
pub mod runner;
pub mod step;

pub use driver::ProcessStep;
pub use step::Step;

use crate::log::{Event, EventBus};
use crate::model::RunSummary;
use crate::notify::WebhookNotifier;
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An ordered group of steps sharing an abort policy and an optional wait.
pub struct Phase {
    pub id: String,
    pub description: String,
    pub steps: Vec<Box<dyn Step>>,
    /// A failing step skips the rest of the phase and aborts the chain.
    pub abort_on_failure: bool,
    /// Runs even when an earlier phase aborted the chain.
    pub independent: bool,
    pub delay: Option<Duration>,
}

impl Phase {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            steps: Vec::new(),
            abort_on_failure: false,
            independent: false,
            delay: None,
        }
    }

    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_abort_on_failure(mut self, abort: bool) -> Self {
        self.abort_on_failure = abort;
        self
    }

    pub fn with_independent(mut self, independent: bool) -> Self {
        self.independent = independent;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("id", &self.id)
            .field("steps", &self.step_names())
            .field("abort_on_failure", &self.abort_on_failure)
            .field("independent", &self.independent)
            .field("delay", &self.delay)
            .finish()
    }
}

pub struct Orchestrator {
    title: String,
    bus: Arc<dyn EventBus>,
    notifier: WebhookNotifier,
}

impl Orchestrator {
    pub fn new(title: impl Into<String>, bus: Arc<dyn EventBus>, notifier: WebhookNotifier) -> Self {
        Self {
            title: title.into(),
            bus,
            notifier,
        }
    }

    /// Runs every phase in order and reports the summary. Every declared
    /// step ends up in exactly one of succeeded, failed or skipped.
    pub async fn run(&self, phases: &[Phase]) -> RunSummary {
        let bus = self.bus.as_ref();
        let started_at = Local::now();
        bus.publish(&Event::RunStarted {
            pipeline: self.title.clone(),
        });

        let mut records = Vec::new();
        let mut chain_aborted = false;

        for phase in phases {
            if chain_aborted && !phase.independent {
                records.extend(runner::skip_phase(phase, bus));
                continue;
            }

            let report = runner::run_phase(phase, bus).await;
            chain_aborted |= report.aborted;
            records.extend(report.records);
        }

        let summary = RunSummary::new(started_at, records);
        bus.publish(&Event::RunFinished {
            succeeded: owned_names(summary.succeeded()),
            failed: owned_names(summary.failed()),
            skipped: owned_names(summary.skipped()),
        });

        let delivery = self.notifier.deliver(&self.title, &summary).await;
        tracing::debug!(run_id = %summary.run_id, ?delivery, "notification finished");
        bus.publish(&delivery.event());

        summary
    }
}

fn owned_names(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}
