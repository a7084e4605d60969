use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Lifecycle events of an orchestrator run, one per narrated transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted { pipeline: String },
    PhaseStarted { id: String, description: String },
    PhaseSkipped { id: String, steps: Vec<String> },
    WaitStarted { reason: String, total: Duration },
    WaitTick { reason: String, remaining: Duration },
    WaitFinished { reason: String },
    StepStarted { name: String, target: String },
    StepSucceeded { name: String, stdout: String },
    StepFailed {
        name: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    StepSkipped { name: String },
    ChainAborted { phase: String, step: String },
    FailureTolerated { step: String },
    RunFinished {
        succeeded: Vec<String>,
        failed: Vec<String>,
        skipped: Vec<String>,
    },
    NotificationSkipped,
    NotificationSent,
    NotificationRejected { status: u16 },
    NotificationFailed { reason: String },
}

const RULE: &str = "=================================================================";

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "Ninguno".to_string()
    } else {
        names.join(", ")
    }
}

impl Event {
    /// Lines the journal writes for this event, each with its own timestamp.
    /// Captured child output stays inside the line of its step.
    pub fn journal_lines(&self) -> Vec<String> {
        self.banner_rows()
            .unwrap_or_else(|| vec![self.to_string()])
    }

    fn banner_rows(&self) -> Option<Vec<String>> {
        match self {
            Event::RunStarted { pipeline } => Some(vec![
                RULE.to_string(),
                format!("🚀 Iniciando Orquestador RPA – {pipeline}"),
                RULE.to_string(),
            ]),
            Event::RunFinished {
                succeeded,
                failed,
                skipped,
            } => Some(vec![
                RULE.to_string(),
                "📊 RESUMEN FINAL DE EJECUCIÓN".to_string(),
                RULE.to_string(),
                format!(
                    "   ✅ Exitosos       ({}): {}",
                    succeeded.len(),
                    list_or_none(succeeded)
                ),
                format!(
                    "   ❌ Fallidos       ({}): {}",
                    failed.len(),
                    list_or_none(failed)
                ),
                format!(
                    "   ⏭  No ejecutados  ({}): {}",
                    skipped.len(),
                    list_or_none(skipped)
                ),
                RULE.to_string(),
            ]),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::RunStarted { .. } | Event::RunFinished { .. } => {
                f.write_str(&self.banner_rows().unwrap_or_default().join("\n"))
            }
            Event::PhaseStarted { id, description } => {
                write!(f, "📋 FASE {id}: {description}")
            }
            Event::PhaseSkipped { id, steps } => write!(
                f,
                "⏭ FASE {id} omitida por fallo previo: {}",
                list_or_none(steps)
            ),
            Event::WaitStarted { reason, total } => write!(
                f,
                "⏳ Esperando {} antes de: {reason}",
                humantime::format_duration(*total)
            ),
            Event::WaitTick { reason, remaining } => write!(
                f,
                "   ⏱  Faltan {} para: {reason}",
                humantime::format_duration(*remaining)
            ),
            Event::WaitFinished { reason } => {
                write!(f, "✅ Espera finalizada. Iniciando: {reason}")
            }
            Event::StepStarted { name, target } => {
                write!(f, "▶ Iniciando proceso: {name} ({target})")
            }
            Event::StepSucceeded { name, stdout } => {
                write!(f, "✅ Proceso '{name}' finalizado correctamente.")?;
                if !stdout.is_empty() {
                    write!(f, "\n   STDOUT:\n{stdout}")?;
                }
                Ok(())
            }
            Event::StepFailed {
                name,
                exit_code,
                stdout,
                stderr,
            } => {
                match exit_code {
                    Some(code) => write!(f, "❌ ERROR en '{name}'. Código de salida: {code}")?,
                    None => write!(f, "❌ ERROR en '{name}'. Sin código de salida")?,
                }
                if !stderr.is_empty() {
                    write!(f, "\n   STDERR:\n{stderr}")?;
                }
                if !stdout.is_empty() {
                    write!(f, "\n   STDOUT:\n{stdout}")?;
                }
                Ok(())
            }
            Event::StepSkipped { name } => write!(f, "⏭ Proceso omitido (fallo previo): {name}"),
            Event::ChainAborted { phase, step } => write!(
                f,
                "⚠ Proceso fallido: '{step}'. Abortando la cadena desde la fase {phase}..."
            ),
            Event::FailureTolerated { step } => write!(
                f,
                "⚠ '{step}' falló, pero se continúa con los siguientes procesos."
            ),
            Event::NotificationSkipped => write!(
                f,
                "⚠ TEAMS_WEBHOOK_URL no configurado. No se enviará resumen final a Teams."
            ),
            Event::NotificationSent => write!(f, "📨 Resumen final enviado a Teams exitosamente."),
            Event::NotificationRejected { status } => {
                write!(f, "❌ Error al enviar resumen a Teams. Status: {status}")
            }
            Event::NotificationFailed { reason } => {
                write!(f, "❌ Excepción al enviar resumen a Teams: {reason}")
            }
        }
    }
}

pub trait EventBus: Send + Sync {
    fn publish(&self, event: &Event);
}

/// Keeps every published event in memory.
#[derive(Default)]
pub struct MemoryBus {
    events: Mutex<Vec<Event>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventBus for MemoryBus {
    fn publish(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
