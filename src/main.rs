//! Audit runner entry point
//!
//! Reads the target list, then audits every URL: one isolated browser
//! session per criterion, chunked completion calls, one report file per
//! criterion with findings, and a timing record per run.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use a11y_auditor::browser::WebDriverFactory;
use a11y_auditor::config::{load_targets, AuditConfig};
use a11y_auditor::llm::OpenAiProvider;
use a11y_auditor::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AuditConfig::parse();
    let targets = load_targets(&config.targets)?;
    info!(targets = targets.len(), runs = config.runs, "audit starting");

    let factory = Arc::new(WebDriverFactory::new(
        config.webdriver_url.clone(),
        config.page_load_timeout_secs,
    ));
    let provider = Arc::new(OpenAiProvider::new(
        config.api_base.clone(),
        config.api_key.clone(),
        config.model.clone(),
    ));
    let scheduler = Scheduler::new(factory, provider).with_budget(config.budget());

    for target in &targets {
        info!(url = %target.url, "auditing target");
        for run in 1..=config.runs {
            let output_dir = if config.runs > 1 {
                config
                    .output_root
                    .join(&target.folder)
                    .join(format!("run_{}", run))
            } else {
                config.output_root.join(&target.folder)
            };

            match scheduler.audit(&target.url, &output_dir).await {
                Ok(report) => info!(
                    url = %target.url,
                    run,
                    elapsed_seconds = report.time_consumed_seconds,
                    "run complete"
                ),
                Err(e) => error!(url = %target.url, run, error = %e, "run failed"),
            }
        }
    }

    Ok(())
}
