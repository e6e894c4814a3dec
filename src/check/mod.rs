//! Criterion Check
//!
//! One check = open an isolated page session, extract evidence, chunk it,
//! query the completion collaborator once per chunk in order, and merge
//! the responses into a single verdict. Every error is absorbed at this
//! boundary and turned into a failure-marked result; a broken criterion
//! must never take its siblings down.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::browser::SessionFactory;
use crate::criteria::Criterion;
use crate::evidence::{chunk_collection, HeuristicEstimator};
use crate::llm::{build_chunk_prompt, verdict_response_format, CompletionProvider, SYSTEM_PROMPT};
use crate::verdict::{aggregate, Verdict};

/// Lifecycle of one scheduled check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pending => write!(f, "pending"),
            CheckStatus::Running => write!(f, "running"),
            CheckStatus::Completed => write!(f, "completed"),
            CheckStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Completed(Verdict),
    Failed { error: String },
}

/// Written once into the shared result set, read once by persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub criterion_id: String,
    pub label: String,
    pub outcome: CheckOutcome,
    /// How many evidence items the extractor reported. A clean verdict
    /// over real evidence is still worth persisting.
    pub evidence_items: usize,
}

impl CheckResult {
    pub fn failed(criterion: &Criterion, error: impl Into<String>) -> Self {
        Self {
            criterion_id: criterion.id.to_string(),
            label: criterion.label.to_string(),
            outcome: CheckOutcome::Failed {
                error: error.into(),
            },
            evidence_items: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Failed { .. })
    }

    /// Whether persistence should write a report file for this result.
    pub fn worth_persisting(&self) -> bool {
        match &self.outcome {
            CheckOutcome::Failed { .. } => true,
            CheckOutcome::Completed(verdict) => !verdict.is_empty() || self.evidence_items > 0,
        }
    }
}

/// Token limits for one check: whole collections at or under the
/// threshold go out as a single request; larger ones are split into
/// chunks of at most the per-chunk budget.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    pub threshold_tokens: usize,
    pub max_chunk_tokens: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            threshold_tokens: 20_000,
            max_chunk_tokens: 5_000,
        }
    }
}

/// Run one criterion end to end. Infallible by design: extraction,
/// browser, and completion errors all collapse into a failure marker
/// carrying the criterion id.
pub async fn run_check(
    criterion: &'static Criterion,
    url: &str,
    factory: &dyn SessionFactory,
    provider: &dyn CompletionProvider,
    budget: TokenBudget,
) -> CheckResult {
    match check_inner(criterion, url, factory, provider, budget).await {
        Ok((verdict, evidence_items)) => CheckResult {
            criterion_id: criterion.id.to_string(),
            label: criterion.label.to_string(),
            outcome: CheckOutcome::Completed(verdict),
            evidence_items,
        },
        Err(e) => {
            warn!(criterion = criterion.id, error = %e, "criterion check failed");
            CheckResult::failed(criterion, format!("{:#}", e))
        }
    }
}

async fn check_inner(
    criterion: &'static Criterion,
    url: &str,
    factory: &dyn SessionFactory,
    provider: &dyn CompletionProvider,
    budget: TokenBudget,
) -> Result<(Verdict, usize)> {
    let session = factory
        .open(url)
        .await
        .with_context(|| format!("opening session for criterion {}", criterion.id))?;

    let outcome = judge(criterion, session.as_ref(), provider, budget).await;

    // The session is torn down whether or not the check succeeded; a
    // failed teardown is not worth failing an otherwise good verdict.
    if let Err(e) = session.close().await {
        debug!(criterion = criterion.id, error = %e, "session close failed");
    }

    outcome
}

async fn judge(
    criterion: &'static Criterion,
    session: &dyn crate::browser::PageSession,
    provider: &dyn CompletionProvider,
    budget: TokenBudget,
) -> Result<(Verdict, usize)> {
    let evidence = criterion
        .extract(session)
        .await
        .with_context(|| format!("extracting evidence for criterion {}", criterion.id))?;
    let evidence_items = evidence.len();

    if evidence.is_empty() {
        debug!(criterion = criterion.id, "no evidence found, skipping completion calls");
        return Ok((Verdict::no_violation(), 0));
    }

    let estimator = HeuristicEstimator;
    let chunks = chunk_collection(
        evidence,
        &estimator,
        budget.threshold_tokens,
        budget.max_chunk_tokens,
    );
    debug!(
        criterion = criterion.id,
        chunks = chunks.len(),
        items = evidence_items,
        "evidence chunked"
    );

    // Chunk calls run sequentially, in chunk order; the merged violation
    // list depends on this ordering.
    let format = verdict_response_format();
    let mut responses = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let parts = build_chunk_prompt(criterion, chunk);
        let raw = provider
            .complete(SYSTEM_PROMPT, &parts, Some(&format))
            .await
            .with_context(|| format!("completion call for criterion {}", criterion.id))?;
        responses.push(raw);
    }

    Ok((aggregate(&responses), evidence_items))
}
