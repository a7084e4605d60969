use crate::executor::step::Step;
use crate::model::StepOutcome;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Runs a step as a child process and maps its exit status to an outcome.
#[derive(Debug, Clone)]
pub struct ProcessStep {
    name: String,
    program: String,
    args: Vec<OsString>,
    script: Option<PathBuf>,
}

impl ProcessStep {
    /// `<interpreter> <script>`. A missing script fails the step without
    /// spawning anything.
    pub fn script(
        name: impl Into<String>,
        interpreter: impl Into<String>,
        script: impl AsRef<Path>,
    ) -> Self {
        let script = script.as_ref().to_path_buf();
        Self {
            name: name.into(),
            program: interpreter.into(),
            args: vec![script.clone().into_os_string()],
            script: Some(script),
        }
    }

    pub fn command<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            script: None,
        }
    }

    pub fn script_path(&self) -> Option<&Path> {
        self.script.as_deref()
    }
}

#[async_trait]
impl Step for ProcessStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        match &self.script {
            Some(script) => script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| script.display().to_string()),
            None => self.program.clone(),
        }
    }

    async fn invoke(&self) -> StepOutcome {
        if let Some(script) = &self.script {
            if !script.exists() {
                return StepOutcome::not_started(format!(
                    "script not found: {}",
                    script.display()
                ));
            }
        }

        tracing::debug!(step = %self.name, program = %self.program, args = ?self.args, "spawning step");

        let output = Command::new(&self.program)
            .args(&self.args)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return StepOutcome::not_started(format!(
                    "cannot start {}: {}",
                    self.program, e
                ))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        tracing::debug!(step = %self.name, status = %output.status, "step exited");

        if output.status.success() {
            StepOutcome::Succeeded { stdout }
        } else {
            StepOutcome::Failed {
                exit_code: output.status.code(),
                stdout,
                stderr,
            }
        }
    }
}
