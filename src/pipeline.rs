use crate::config::Config;
use crate::error::{OrchestratorError, Result};
use crate::executor::{Phase, ProcessStep};
use crate::model::{PhaseSpec, PipelineSpec, StepSpec};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

fn step(name: &str, script: &str) -> StepSpec {
    StepSpec {
        name: name.to_string(),
        script: script.into(),
    }
}

/// Multichannel download first (best effort), then the predictive chain,
/// then the two timed downloads that depend on that chain.
pub fn weekday() -> PipelineSpec {
    PipelineSpec {
        name: "weekday".to_string(),
        title: "PROMOTORA PREDICTIVO".to_string(),
        log_prefix: "orquestador".to_string(),
        phases: vec![
            PhaseSpec {
                id: "1".to_string(),
                description: "Descargue Multicanal (no bloquea si falla)".to_string(),
                steps: vec![step("Descargue Multicanal", "RPA_descargue_multicanal.py")],
                abort_on_failure: false,
                independent: true,
                wait: None,
            },
            PhaseSpec {
                id: "1b".to_string(),
                description: "Procesos encadenados".to_string(),
                steps: vec![
                    step("Procesamiento Predictivo", "main_predictivo.py"),
                    step("Cargue Promotora", "RPA_Cargue.py"),
                ],
                abort_on_failure: true,
                independent: false,
                wait: None,
            },
            PhaseSpec {
                id: "2".to_string(),
                description: "Descargue Gestiones y Acuerdos".to_string(),
                steps: vec![step(
                    "Descargue Gestiones y Acuerdos",
                    "descargue_gestiones_acuerdos.py",
                )],
                abort_on_failure: false,
                independent: false,
                wait: Some("5m".to_string()),
            },
            PhaseSpec {
                id: "3".to_string(),
                description: "Contingencia Descargue Gest./Ac.".to_string(),
                steps: vec![step(
                    "Contingencia Descargue Gest./Ac.",
                    "contingencia_descargue_ges_ac.py",
                )],
                abort_on_failure: false,
                independent: false,
                wait: Some("40m".to_string()),
            },
        ],
    }
}

/// Databricks extraction, file preparation and CRM upload, strictly chained.
pub fn saturday() -> PipelineSpec {
    PipelineSpec {
        name: "saturday".to_string(),
        title: "PROMOTORA PREDICTIVO SÁBADO".to_string(),
        log_prefix: "orquestador_sabado".to_string(),
        phases: vec![PhaseSpec {
            id: "1".to_string(),
            description: "Cargue predictivo sábado".to_string(),
            steps: vec![
                step("Descarga Predictivo Databricks", "descarga_predictivo_sabado.py"),
                step("Preparación Predictivo Sábado", "predictivo_sabado.py"),
                step("Cargue Promotora", "RPA_Cargue.py"),
            ],
            abort_on_failure: true,
            independent: false,
            wait: None,
        }],
    }
}

impl PipelineSpec {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data =
            std::fs::read_to_string(path).map_err(|source| OrchestratorError::PipelineRead {
                path: path.to_path_buf(),
                source,
            })?;
        let spec: PipelineSpec = serde_json::from_str(&data)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Step names key the run summary, so they must be unique; waits must
    /// parse.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for phase in &self.phases {
            phase.delay()?;
            for step in &phase.steps {
                if !seen.insert(step.name.as_str()) {
                    return Err(OrchestratorError::DuplicateStep(step.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Turns the declaration into runnable phases of script steps.
    pub fn build(&self, config: &Config) -> Result<Vec<Phase>> {
        self.validate()?;

        self.phases
            .iter()
            .map(|spec| -> Result<Phase> {
                let mut phase = Phase::new(&spec.id, &spec.description)
                    .with_abort_on_failure(spec.abort_on_failure)
                    .with_independent(spec.independent);
                if let Some(delay) = spec.delay()? {
                    phase = phase.with_delay(delay);
                }
                for step in &spec.steps {
                    phase = phase.with_step(ProcessStep::script(
                        &step.name,
                        &config.interpreter,
                        config.resolve_script(&step.script),
                    ));
                }
                Ok(phase)
            })
            .collect()
    }

    /// Human-readable listing of what a run would do, without running it.
    pub fn render_plan(&self, config: &Config) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Pipeline {} – {}", self.name, self.title);
        let _ = writeln!(
            out,
            "Log file: {}",
            config
                .logs_dir
                .join(format!("{}_<YYYYMMDD>.log", self.log_prefix))
                .display()
        );

        for phase in &self.phases {
            let mut flags = Vec::new();
            if phase.independent {
                flags.push("independent".to_string());
            }
            if phase.abort_on_failure {
                flags.push("aborts chain on failure".to_string());
            }
            if let Some(wait) = &phase.wait {
                flags.push(format!("waits {}", wait));
            }
            let _ = writeln!(out);
            let _ = write!(out, "PHASE {}: {}", phase.id, phase.description);
            if !flags.is_empty() {
                let _ = write!(out, " [{}]", flags.join(", "));
            }
            let _ = writeln!(out);

            for step in &phase.steps {
                let script = config.resolve_script(&step.script);
                let marker = if script.exists() { "" } else { " (missing)" };
                let _ = writeln!(
                    out,
                    "  - {}: {} {}{}",
                    step.name,
                    config.interpreter,
                    script.display(),
                    marker
                );
            }
        }
        out
    }
}

impl PhaseSpec {
    pub fn delay(&self) -> Result<Option<Duration>> {
        match &self.wait {
            Some(raw) => humantime::parse_duration(raw).map(Some).map_err(|source| {
                OrchestratorError::InvalidDelay {
                    phase: self.id.clone(),
                    value: raw.clone(),
                    source,
                }
            }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Step;
    use tempfile::TempDir;

    #[test]
    fn test_weekday_declaration() {
        let spec = weekday();
        spec.validate().unwrap();

        assert_eq!(spec.phases.len(), 4);
        assert!(spec.phases[0].independent);
        assert!(!spec.phases[0].abort_on_failure);
        assert!(spec.phases[1].abort_on_failure);
        assert_eq!(
            spec.phases[2].delay().unwrap(),
            Some(Duration::from_secs(5 * 60))
        );
        assert_eq!(
            spec.phases[3].delay().unwrap(),
            Some(Duration::from_secs(40 * 60))
        );
        assert!(!spec.phases[3].independent);
    }

    #[test]
    fn test_saturday_declaration() {
        let spec = saturday();
        spec.validate().unwrap();

        assert_eq!(spec.log_prefix, "orquestador_sabado");
        assert_eq!(spec.phases.len(), 1);
        assert!(spec.phases[0].abort_on_failure);
        assert_eq!(spec.phases[0].steps.len(), 3);
        assert_eq!(spec.phases[0].delay().unwrap(), None);
    }

    #[test]
    fn test_build_resolves_scripts_and_delays() {
        let config = Config::default().with_base_dir("/srv/rpa");
        let phases = weekday().build(&config).unwrap();

        assert_eq!(phases.len(), 4);
        assert_eq!(
            phases[1].step_names(),
            vec!["Procesamiento Predictivo", "Cargue Promotora"]
        );
        assert_eq!(phases[1].steps[1].describe(), "RPA_Cargue.py");
        assert_eq!(phases[2].delay, Some(Duration::from_secs(300)));
        assert!(phases[0].independent);
        assert!(phases[1].abort_on_failure);
    }

    #[test]
    fn test_duplicate_step_names_rejected() {
        let mut spec = saturday();
        spec.phases[0].steps.push(step("Cargue Promotora", "other.py"));

        let err = spec.validate().unwrap_err();
        assert!(matches!(err, OrchestratorError::DuplicateStep(name) if name == "Cargue Promotora"));
    }

    #[test]
    fn test_invalid_wait_rejected() {
        let mut spec = weekday();
        spec.phases[2].wait = Some("five minutes".to_string());

        let err = spec.build(&Config::default()).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidDelay { ref phase, .. } if phase == "2"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("pipeline.json");
        std::fs::write(&path, serde_json::to_string_pretty(&saturday()).unwrap()).unwrap();

        let loaded = PipelineSpec::load(&path).unwrap();
        assert_eq!(loaded, saturday());
    }

    #[test]
    fn test_load_errors() {
        let tmp = TempDir::new().expect("create temp dir");

        let missing = PipelineSpec::load(tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, OrchestratorError::PipelineRead { .. }));

        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let bad = PipelineSpec::load(&path).unwrap_err();
        assert!(matches!(bad, OrchestratorError::PipelineParse(_)));
    }

    #[test]
    fn test_render_plan_marks_missing_scripts() {
        let tmp = TempDir::new().expect("create temp dir");
        std::fs::write(tmp.path().join("RPA_Cargue.py"), "").unwrap();
        let config = Config::default().with_base_dir(tmp.path());

        let plan = saturday().render_plan(&config);

        assert!(plan.starts_with("Pipeline saturday – PROMOTORA PREDICTIVO SÁBADO"));
        assert!(plan.contains("orquestador_sabado_<YYYYMMDD>.log"));
        assert!(plan.contains("[aborts chain on failure]"));
        assert!(plan.contains("predictivo_sabado.py (missing)"));
        assert!(!plan.contains("RPA_Cargue.py (missing)"));
    }
}
