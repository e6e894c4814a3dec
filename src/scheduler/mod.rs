//! Check Scheduler
//!
//! Fans every registered criterion out as its own task with its own
//! browser session, collects one result per criterion into a shared
//! write-once map, and persists the non-empty verdicts plus a run-level
//! timing record. Failures are isolated: a hung or broken check never
//! blocks its siblings, and the timing file is written even when every
//! criterion failed.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::browser::SessionFactory;
use crate::check::{run_check, CheckOutcome, CheckResult, CheckStatus, TokenBudget};
use crate::criteria::{registry, Criterion};
use crate::llm::CompletionProvider;

pub struct RunReport {
    pub results: HashMap<String, CheckResult>,
    pub time_consumed_seconds: f64,
}

pub struct Scheduler {
    factory: Arc<dyn SessionFactory>,
    provider: Arc<dyn CompletionProvider>,
    budget: TokenBudget,
}

impl Scheduler {
    pub fn new(factory: Arc<dyn SessionFactory>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            factory,
            provider,
            budget: TokenBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Audit one URL: run every registered criterion concurrently,
    /// persist the reports under `output_dir`, and return the collected
    /// results with the elapsed wall time.
    pub async fn audit(&self, url: &str, output_dir: &Path) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, url, criteria = registry().len(), "audit run started");

        let started = Instant::now();
        let results = self.run_all(registry(), url).await;
        let time_consumed_seconds = started.elapsed().as_secs_f64();

        persist_results(output_dir, &results, time_consumed_seconds).await?;

        let failed = results.values().filter(|r| r.is_failed()).count();
        info!(
            %run_id,
            url,
            criteria = results.len(),
            failed,
            elapsed_seconds = time_consumed_seconds,
            "audit run finished"
        );

        Ok(RunReport {
            results,
            time_consumed_seconds,
        })
    }

    /// Fan the checks out and wait for all of them to reach a terminal
    /// state. The returned map holds exactly one entry per scheduled
    /// criterion, failure markers included.
    pub async fn run_all(
        &self,
        criteria: &'static [Criterion],
        url: &str,
    ) -> HashMap<String, CheckResult> {
        let shared: Arc<Mutex<HashMap<String, CheckResult>>> =
            Arc::new(Mutex::new(HashMap::with_capacity(criteria.len())));

        let mut handles = Vec::with_capacity(criteria.len());
        for criterion in criteria {
            info!(criterion = criterion.id, status = %CheckStatus::Pending, "check scheduled");
            let factory = self.factory.clone();
            let provider = self.provider.clone();
            let budget = self.budget;
            let url = url.to_string();
            let shared = shared.clone();

            handles.push((
                criterion,
                tokio::spawn(async move {
                    info!(criterion = criterion.id, status = %CheckStatus::Running, "check started");
                    let result =
                        run_check(criterion, &url, factory.as_ref(), provider.as_ref(), budget)
                            .await;
                    let status = if result.is_failed() {
                        CheckStatus::Failed
                    } else {
                        CheckStatus::Completed
                    };
                    info!(criterion = criterion.id, status = %status, "check finished");
                    shared.lock().await.insert(result.criterion_id.clone(), result);
                }),
            ));
        }

        let (criteria_order, joins): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes = join_all(joins).await;

        let mut results = std::mem::take(&mut *shared.lock().await);

        // A panicked task never wrote its entry; record the failure so a
        // result exists for every scheduled criterion.
        for (criterion, outcome) in criteria_order.into_iter().zip(outcomes) {
            if let Err(join_error) = outcome {
                warn!(criterion = criterion.id, error = %join_error, "check task aborted");
                results
                    .entry(criterion.id.to_string())
                    .or_insert_with(|| CheckResult::failed(criterion, join_error.to_string()));
            }
        }

        results
    }
}

/// Write one report file per criterion worth persisting, plus the
/// run-level timing record.
pub async fn persist_results(
    output_dir: &Path,
    results: &HashMap<String, CheckResult>,
    time_consumed_seconds: f64,
) -> Result<()> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    for result in results.values() {
        if !result.worth_persisting() {
            continue;
        }
        match &result.outcome {
            CheckOutcome::Completed(verdict) => {
                let path = output_dir.join(format!("{}.json", result.criterion_id));
                let body = serde_json::to_string_pretty(verdict)?;
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            CheckOutcome::Failed { error } => {
                let path = output_dir.join(format!("{}.error.json", result.criterion_id));
                let body = serde_json::to_string_pretty(&json!({
                    "criterion": result.criterion_id,
                    "label": result.label,
                    "error": error,
                }))?;
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
    }

    let timing_path = output_dir.join("time_consumed.json");
    let timing = serde_json::to_string_pretty(&json!({
        "time_consumed_seconds": time_consumed_seconds,
        "finished_at": chrono::Utc::now().to_rfc3339(),
    }))?;
    tokio::fs::write(&timing_path, timing)
        .await
        .with_context(|| format!("writing {}", timing_path.display()))?;

    Ok(())
}
