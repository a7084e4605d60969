#[cfg(test)]
mod tests {
    use crate::model::*;
    use chrono::Local;
    use serde_json::json;

    fn failed(code: i32) -> StepOutcome {
        StepOutcome::Failed {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: "boom".to_string(),
        }
    }

    fn ok() -> StepOutcome {
        StepOutcome::Succeeded {
            stdout: "done".to_string(),
        }
    }

    #[test]
    fn test_summary_partitions_records() {
        let summary = RunSummary::new(
            Local::now(),
            vec![
                StepRecord::new("a", ok()),
                StepRecord::new("b", failed(2)),
                StepRecord::skipped("c"),
                StepRecord::new("d", ok()),
            ],
        );

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.succeeded(), vec!["a", "d"]);
        assert_eq!(summary.failed(), vec!["b"]);
        assert_eq!(summary.skipped(), vec!["c"]);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_empty_summary_is_clean() {
        let summary = RunSummary::new(Local::now(), vec![]);
        assert_eq!(summary.total(), 0);
        assert!(summary.is_clean());
        assert!(summary.finished_at >= summary.started_at);
    }

    #[test]
    fn test_outcome_lookup() {
        let summary = RunSummary::new(Local::now(), vec![StepRecord::new("load", failed(1))]);
        assert_eq!(summary.outcome_of("load"), Some(&failed(1)));
        assert_eq!(summary.outcome_of("missing"), None);
    }

    #[test]
    fn test_not_started_has_no_exit_code() {
        let outcome = StepOutcome::not_started("script not found");
        assert!(outcome.is_failure());
        match outcome {
            StepOutcome::Failed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, None);
                assert_eq!(stderr, "script not found");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_phase_spec_defaults() {
        let value = json!({
            "id": "upload",
            "description": "Upload to CRM",
            "steps": [{ "name": "Cargue", "script": "RPA_Cargue.py" }]
        });

        let phase: PhaseSpec = serde_json::from_value(value).unwrap();
        assert!(!phase.abort_on_failure);
        assert!(!phase.independent);
        assert_eq!(phase.wait, None);
        assert_eq!(phase.steps[0].script.to_str(), Some("RPA_Cargue.py"));
    }

    #[test]
    fn test_pipeline_spec_deserialization() {
        let value = json!({
            "name": "weekday",
            "title": "PROMOTORA",
            "log_prefix": "orquestador",
            "phases": [
                {
                    "id": "chain",
                    "description": "Chained",
                    "abortOnFailure": true,
                    "steps": [
                        { "name": "one", "script": "one.py" },
                        { "name": "two", "script": "two.py" }
                    ]
                },
                {
                    "id": "late",
                    "description": "Late download",
                    "wait": "5m",
                    "independent": true,
                    "steps": []
                }
            ]
        });

        let spec: PipelineSpec = serde_json::from_value(value).unwrap();
        assert_eq!(spec.phases.len(), 2);
        assert!(spec.phases[0].abort_on_failure);
        assert_eq!(spec.phases[0].steps.len(), 2);
        assert_eq!(spec.phases[1].wait.as_deref(), Some("5m"));
        assert!(spec.phases[1].independent);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(StepOutcome::Skipped).unwrap();
        assert_eq!(value, json!({ "status": "skipped" }));

        let value = serde_json::to_value(failed(3)).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["exit_code"], 3);
    }
}
