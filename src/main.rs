use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rpa_orchestrator::config::{load_env_file, Config};
use rpa_orchestrator::log::{init_logger, Journal};
use rpa_orchestrator::notify::WebhookNotifier;
use rpa_orchestrator::{pipeline, Orchestrator, PipelineSpec};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rpa-orchestrator")]
#[command(about = "Runs the RPA step pipelines and reports the outcome", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory the step scripts are resolved against
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    /// Variables file to load instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline and send the final summary
    Run(Target),
    /// Print the phases and steps a pipeline would execute
    Plan(Target),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    #[arg(value_enum)]
    pipeline: Option<PipelineKind>,

    /// JSON pipeline declaration
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PipelineKind {
    Weekday,
    Saturday,
}

impl Target {
    fn resolve(&self) -> Result<PipelineSpec> {
        match (&self.file, self.pipeline) {
            (Some(path), _) => PipelineSpec::load(path)
                .with_context(|| format!("Failed to load pipeline {}", path.display())),
            (None, Some(PipelineKind::Weekday)) => Ok(pipeline::weekday()),
            (None, Some(PipelineKind::Saturday)) => Ok(pipeline::saturday()),
            (None, None) => anyhow::bail!("Either a pipeline name or --file is required"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_env_file(cli.env_file.as_deref())?;
    init_logger();

    let mut config = Config::from_env();
    if let Some(dir) = &cli.base_dir {
        config = config.with_base_dir(dir);
    }
    if let Some(dir) = &cli.logs_dir {
        config = config.with_logs_dir(dir);
    }
    tracing::debug!(?config, "configuration loaded");

    match &cli.command {
        Commands::Plan(target) => {
            let spec = target.resolve()?;
            print!("{}", spec.render_plan(&config));
        }
        Commands::Run(target) => {
            let spec = target.resolve()?;
            let phases = spec.build(&config)?;
            let journal = Journal::open(&config.logs_dir, &spec.log_prefix)
                .context("Failed to prepare the orchestrator log")?;
            let notifier = WebhookNotifier::new(config.webhook_url.clone(), config.notify_timeout)?;

            let journal = Arc::new(journal);
            let orchestrator = Orchestrator::new(&spec.title, journal.clone(), notifier);
            let summary = orchestrator.run(&phases).await;

            tracing::info!(
                run_id = %summary.run_id,
                succeeded = summary.succeeded().len(),
                failed = summary.failed().len(),
                skipped = summary.skipped().len(),
                "run complete"
            );

            match journal.write_summary(&summary) {
                Ok(path) => tracing::info!(path = %path.display(), "run summary written"),
                Err(e) => tracing::warn!("{}", e),
            }
        }
    }

    Ok(())
}
