use crate::error::{OrchestratorError, Result};
use crate::log::{Event, EventBus};
use crate::model::RunSummary;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only daily log, mirrored line by line to stdout.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
    prefix: String,
    echo: bool,
}

impl Journal {
    /// Creates the log directory if needed. Failing here is fatal for a run.
    pub fn open(dir: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| OrchestratorError::LogDirectory {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            prefix: prefix.into(),
            echo: true,
        })
    }

    /// Stops mirroring lines to stdout.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path_for(&self, at: DateTime<Local>) -> PathBuf {
        self.dir
            .join(format!("{}_{}.log", self.prefix, at.format("%Y%m%d")))
    }

    pub fn current_path(&self) -> PathBuf {
        self.path_for(Local::now())
    }

    pub fn format_line(at: DateTime<Local>, message: &str) -> String {
        format!("[{}] {}", at.format("%Y-%m-%d %H:%M:%S"), message)
    }

    pub fn write(&self, message: &str) -> Result<()> {
        let now = Local::now();
        let line = Self::format_line(now, message);
        if self.echo {
            println!("{}", line);
        }

        let path = self.path_for(now);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| writeln!(file, "{}", line))
            .map_err(|source| OrchestratorError::LogWrite { path, source })
    }

    /// Stores the summary as JSON next to the daily log, one file per run.
    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let path = self.dir.join(format!(
            "{}_{}_summary.json",
            self.prefix,
            summary.finished_at.format("%Y%m%d_%H%M%S")
        ));
        serde_json::to_vec_pretty(summary)
            .map_err(std::io::Error::from)
            .and_then(|data| std::fs::write(&path, data))
            .map_err(|source| OrchestratorError::SummaryWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

impl EventBus for Journal {
    fn publish(&self, event: &Event) {
        for line in event.journal_lines() {
            if let Err(e) = self.write(&line) {
                tracing::warn!("{}", e);
            }
        }
    }
}
