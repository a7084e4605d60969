use crate::executor::{Phase, Step};
use crate::log::{Event, EventBus};
use crate::model::{StepOutcome, StepRecord};
use std::time::Duration;
use tokio::time::sleep;

/// Interval between remaining-time lines during a pre-phase wait.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct PhaseReport {
    pub records: Vec<StepRecord>,
    /// Set when a step failed in a phase that aborts the chain.
    pub aborted: bool,
}

pub async fn run_phase(phase: &Phase, bus: &dyn EventBus) -> PhaseReport {
    bus.publish(&Event::PhaseStarted {
        id: phase.id.clone(),
        description: phase.description.clone(),
    });

    if let Some(delay) = phase.delay {
        countdown(bus, &phase.description, delay).await;
    }

    let mut records = Vec::with_capacity(phase.steps.len());
    let mut aborted = false;

    for step in &phase.steps {
        if aborted {
            bus.publish(&Event::StepSkipped {
                name: step.name().to_string(),
            });
            records.push(StepRecord::skipped(step.name()));
            continue;
        }

        bus.publish(&Event::StepStarted {
            name: step.name().to_string(),
            target: step.describe(),
        });

        let outcome = step.invoke().await;
        match &outcome {
            StepOutcome::Succeeded { stdout } => bus.publish(&Event::StepSucceeded {
                name: step.name().to_string(),
                stdout: stdout.clone(),
            }),
            StepOutcome::Failed {
                exit_code,
                stdout,
                stderr,
            } => {
                bus.publish(&Event::StepFailed {
                    name: step.name().to_string(),
                    exit_code: *exit_code,
                    stdout: stdout.clone(),
                    stderr: stderr.clone(),
                });
                if phase.abort_on_failure {
                    aborted = true;
                    bus.publish(&Event::ChainAborted {
                        phase: phase.id.clone(),
                        step: step.name().to_string(),
                    });
                } else {
                    bus.publish(&Event::FailureTolerated {
                        step: step.name().to_string(),
                    });
                }
            }
            StepOutcome::Skipped => bus.publish(&Event::StepSkipped {
                name: step.name().to_string(),
            }),
        }

        records.push(StepRecord::new(step.name(), outcome));
    }

    PhaseReport { records, aborted }
}

/// Records every step of the phase as skipped. Neither the steps nor the
/// pre-phase wait are entered.
pub fn skip_phase(phase: &Phase, bus: &dyn EventBus) -> Vec<StepRecord> {
    let names: Vec<String> = phase.steps.iter().map(|s| s.name().to_string()).collect();
    bus.publish(&Event::PhaseSkipped {
        id: phase.id.clone(),
        steps: names.clone(),
    });
    names.into_iter().map(StepRecord::skipped).collect()
}

pub async fn countdown(bus: &dyn EventBus, reason: &str, total: Duration) {
    bus.publish(&Event::WaitStarted {
        reason: reason.to_string(),
        total,
    });

    let mut remaining = total;
    while !remaining.is_zero() {
        let tick = remaining.min(COUNTDOWN_TICK);
        sleep(tick).await;
        remaining -= tick;
        if !remaining.is_zero() {
            bus.publish(&Event::WaitTick {
                reason: reason.to_string(),
                remaining,
            });
        }
    }

    bus.publish(&Event::WaitFinished {
        reason: reason.to_string(),
    });
}
