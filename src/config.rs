use crate::error::{OrchestratorError, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_INTERPRETER: &str = "python3";
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
pub const LOGS_DIR_NAME: &str = "logs_orquestador";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the step scripts are resolved against.
    pub base_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Program used to run each step script.
    pub interpreter: String,
    pub webhook_url: Option<String>,
    pub notify_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = PathBuf::from(".");
        Self {
            logs_dir: base_dir.join(LOGS_DIR_NAME),
            base_dir,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            webhook_url: None,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let base_dir = non_empty_var("RPA_BASE_DIR")
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let logs_dir = non_empty_var("RPA_LOGS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join(LOGS_DIR_NAME));

        let notify_timeout = match non_empty_var("RPA_NOTIFY_TIMEOUT") {
            Some(raw) => humantime::parse_duration(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring RPA_NOTIFY_TIMEOUT={:?}: {}", raw, e);
                DEFAULT_NOTIFY_TIMEOUT
            }),
            None => DEFAULT_NOTIFY_TIMEOUT,
        };

        Self {
            base_dir,
            logs_dir,
            interpreter: non_empty_var("RPA_PYTHON")
                .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            webhook_url: non_empty_var("TEAMS_WEBHOOK_URL"),
            notify_timeout,
        }
    }

    /// Re-roots the configuration. The logs directory follows the base
    /// directory unless it was set explicitly.
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        if self.logs_dir == self.base_dir.join(LOGS_DIR_NAME) {
            self.logs_dir = base_dir.join(LOGS_DIR_NAME);
        }
        self.base_dir = base_dir;
        self
    }

    pub fn with_logs_dir(mut self, logs_dir: impl AsRef<Path>) -> Self {
        self.logs_dir = logs_dir.as_ref().to_path_buf();
        self
    }

    pub fn resolve_script(&self, script: &Path) -> PathBuf {
        if script.is_absolute() {
            script.to_path_buf()
        } else {
            self.base_dir.join(script)
        }
    }
}

/// Loads variables from `path`, or from `./.env` when present. Variables
/// already set in the process win. Must run before the logger is set up so
/// `RUST_LOG` from the file applies.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| OrchestratorError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }
    Ok(())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
