use crate::error::Result;
use crate::log::Event;
use crate::model::RunSummary;
use serde_json::json;
use std::time::Duration;

/// Result of posting the final summary. Never escalated past a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No webhook configured.
    Skipped,
    Sent,
    Rejected(u16),
    Failed(String),
}

impl Delivery {
    pub fn event(&self) -> Event {
        match self {
            Delivery::Skipped => Event::NotificationSkipped,
            Delivery::Sent => Event::NotificationSent,
            Delivery::Rejected(status) => Event::NotificationRejected { status: *status },
            Delivery::Failed(reason) => Event::NotificationFailed {
                reason: reason.clone(),
            },
        }
    }
}

/// Posts `{"text": ...}` to an incoming webhook (Teams style).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    target: Option<(reqwest::Client, String)>,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self> {
        let target = match url {
            Some(url) => {
                let client = reqwest::Client::builder().timeout(timeout).build()?;
                Some((client, url))
            }
            None => None,
        };
        Ok(Self { target })
    }

    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub async fn deliver(&self, title: &str, summary: &RunSummary) -> Delivery {
        let Some((client, url)) = &self.target else {
            return Delivery::Skipped;
        };

        let payload = json!({ "text": render_message(title, summary) });
        match client.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => Delivery::Sent,
            Ok(resp) => Delivery::Rejected(resp.status().as_u16()),
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }
}

pub fn render_message(title: &str, summary: &RunSummary) -> String {
    let succeeded = summary.succeeded();
    let failed = summary.failed();
    let skipped = summary.skipped();

    let mut lines = vec![
        format!("📊 *Resumen de ejecución RPA – {}*", title),
        String::new(),
        format!(
            "**Fecha/Hora:** {}",
            summary.finished_at.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("**Total procesos:** {}", summary.total()),
        format!("**Exitosos:** {}", succeeded.len()),
        format!("**Fallidos / Detenidos:** {}", failed.len() + skipped.len()),
        String::new(),
    ];

    let sections = [
        ("✅ **Procesos exitosos:**", &succeeded),
        ("❌ **Procesos fallidos:**", &failed),
        ("⏭ **No ejecutados (abortados por fallo previo):**", &skipped),
    ];
    for (heading, names) in sections {
        if names.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        lines.extend(names.iter().map(|n| format!("- {}", n)));
        lines.push(String::new());
    }

    if !summary.is_clean() {
        lines.push("_Revisar logs locales del orquestador para más detalle._".to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StepOutcome, StepRecord};
    use chrono::{Local, TimeZone};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summary(records: Vec<StepRecord>) -> RunSummary {
        let mut summary = RunSummary::new(Local::now(), records);
        summary.finished_at = Local.with_ymd_and_hms(2025, 3, 10, 7, 45, 0).unwrap();
        summary
    }

    fn mixed() -> RunSummary {
        summary(vec![
            StepRecord::new(
                "Descargue Multicanal",
                StepOutcome::Succeeded {
                    stdout: String::new(),
                },
            ),
            StepRecord::new("Procesamiento Predictivo", StepOutcome::not_started("x")),
            StepRecord::skipped("Cargue Promotora"),
        ])
    }

    #[test]
    fn test_render_counts_and_lists() {
        let text = render_message("PROMOTORA PREDICTIVO", &mixed());

        assert!(text.starts_with("📊 *Resumen de ejecución RPA – PROMOTORA PREDICTIVO*"));
        assert!(text.contains("**Fecha/Hora:** 2025-03-10 07:45:00"));
        assert!(text.contains("**Total procesos:** 3"));
        assert!(text.contains("**Exitosos:** 1"));
        assert!(text.contains("**Fallidos / Detenidos:** 2"));
        assert!(text.contains("✅ **Procesos exitosos:**\n- Descargue Multicanal"));
        assert!(text.contains("❌ **Procesos fallidos:**\n- Procesamiento Predictivo"));
        assert!(text.contains("⏭ **No ejecutados (abortados por fallo previo):**\n- Cargue Promotora"));
        assert!(text.ends_with("_Revisar logs locales del orquestador para más detalle._"));
    }

    #[test]
    fn test_render_clean_run_has_no_footer() {
        let clean = summary(vec![StepRecord::new(
            "Cargue Promotora",
            StepOutcome::Succeeded {
                stdout: String::new(),
            },
        )]);
        let text = render_message("SÁBADO", &clean);

        assert!(!text.contains("Procesos fallidos"));
        assert!(!text.contains("No ejecutados"));
        assert!(!text.contains("Revisar logs"));
    }

    #[tokio::test]
    async fn test_deliver_without_url_is_skipped() {
        let notifier = WebhookNotifier::disabled();
        assert_eq!(notifier.deliver("x", &mixed()).await, Delivery::Skipped);
    }

    #[tokio::test]
    async fn test_deliver_posts_text_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "text": render_message("PROMOTORA", &mixed())
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(
            Some(format!("{}/hook", server.uri())),
            Duration::from_secs(10),
        )
        .unwrap();

        assert_eq!(notifier.deliver("PROMOTORA", &mixed()).await, Delivery::Sent);
    }

    #[tokio::test]
    async fn test_deliver_reports_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(Some(server.uri()), Duration::from_secs(10)).unwrap();
        let delivery = notifier.deliver("PROMOTORA", &mixed()).await;

        assert_eq!(delivery, Delivery::Rejected(500));
        assert_eq!(delivery.event(), Event::NotificationRejected { status: 500 });
    }

    #[tokio::test]
    async fn test_deliver_reports_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(Some(server.uri()), Duration::from_millis(200)).unwrap();

        assert!(matches!(
            notifier.deliver("PROMOTORA", &mixed()).await,
            Delivery::Failed(_)
        ));
    }
}
