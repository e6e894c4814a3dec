//! End-to-end pipeline tests over mock collaborators
//!
//! Drives the scheduler across the full criterion registry with a mock
//! browser and a mock completion endpoint, verifying failure isolation,
//! one-result-per-criterion collection, and persistence.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use a11y_auditor::browser::{BrowserError, PageSession, SessionFactory};
use a11y_auditor::criteria;
use a11y_auditor::llm::{CompletionError, CompletionProvider, PromptPart};
use a11y_auditor::{CheckOutcome, Scheduler};

/// Session that answers selector queries but fails every script probe,
/// as a stale or script-blocking page would.
struct FlakySession {
    scripts_fail: bool,
}

#[async_trait]
impl PageSession for FlakySession {
    async fn outer_html_by_css(&self, _selector: &str) -> Result<Vec<String>, BrowserError> {
        Ok(vec!["<a href=\"/x\">click here</a>".to_string()])
    }

    async fn attributes_by_css(
        &self,
        _selector: &str,
        _attributes: &[&str],
    ) -> Result<Vec<(String, String)>, BrowserError> {
        Ok(vec![(
            "<img src=\"hero.png\">".to_string(),
            "alt=<absent>".to_string(),
        )])
    }

    async fn execute_script(
        &self,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        if self.scripts_fail {
            Err(BrowserError::Protocol("script execution blocked".to_string()))
        } else {
            Ok(Value::Array(vec![Value::from("probe line")]))
        }
    }

    async fn screenshot_png_base64(&self) -> Result<String, BrowserError> {
        Ok("QUJD".to_string())
    }

    async fn set_window_size(&self, _w: u32, _h: u32) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn page_title(&self) -> Result<String, BrowserError> {
        Ok("mock".to_string())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok("http://localhost/".to_string())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        Ok(())
    }
}

struct CountingFactory {
    sessions_opened: AtomicUsize,
    scripts_fail: bool,
}

impl CountingFactory {
    fn new(scripts_fail: bool) -> Self {
        Self {
            sessions_opened: AtomicUsize::new(0),
            scripts_fail,
        }
    }
}

#[async_trait]
impl SessionFactory for CountingFactory {
    async fn open(&self, _url: &str) -> Result<Box<dyn PageSession>, BrowserError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FlakySession {
            scripts_fail: self.scripts_fail,
        }))
    }
}

/// Flags a violation only when the prompt targets the given criterion.
struct TargetedProvider {
    violating_criterion: &'static str,
}

#[async_trait]
impl CompletionProvider for TargetedProvider {
    async fn complete(
        &self,
        _system: &str,
        parts: &[PromptPart],
        _format: Option<&Value>,
    ) -> Result<String, CompletionError> {
        let text: String = parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if text.contains(&format!("WCAG SC {} ", self.violating_criterion)) {
            Ok(r#"{"overall_violation": "Yes", "violated_elements_and_reasons": [{"element": "<a href=\"/x\">click here</a>", "reason": "link text is not descriptive", "recommendation": "name the destination"}]}"#.to_string())
        } else {
            Ok(r#"{"overall_violation": "No", "violated_elements_and_reasons": []}"#.to_string())
        }
    }
}

#[tokio::test]
async fn every_scheduled_criterion_gets_a_result() {
    let factory = Arc::new(CountingFactory::new(false));
    let provider = Arc::new(TargetedProvider {
        violating_criterion: "2.4.9",
    });
    let scheduler = Scheduler::new(factory.clone(), provider);

    let results = scheduler.run_all(criteria::registry(), "http://localhost/").await;

    assert_eq!(results.len(), criteria::registry().len());
    for criterion in criteria::registry() {
        assert!(results.contains_key(criterion.id), "missing {}", criterion.id);
    }
    // One isolated session per criterion, never shared.
    assert_eq!(
        factory.sessions_opened.load(Ordering::SeqCst),
        criteria::registry().len()
    );
}

#[tokio::test]
async fn script_failures_stay_isolated_from_selector_checks() {
    let factory = Arc::new(CountingFactory::new(true));
    let provider = Arc::new(TargetedProvider {
        violating_criterion: "2.4.9",
    });
    let scheduler = Scheduler::new(factory, provider);

    let results = scheduler.run_all(criteria::registry(), "http://localhost/").await;

    // Script-probe criteria fail on this page...
    let contrast = &results["1.4.3"];
    assert!(contrast.is_failed());
    match &contrast.outcome {
        CheckOutcome::Failed { error } => assert!(error.contains("1.4.3")),
        _ => unreachable!(),
    }

    // ...while selector-driven siblings still complete normally.
    let non_text = &results["1.1.1"];
    assert!(!non_text.is_failed());
    let link_only = &results["2.4.9"];
    match &link_only.outcome {
        CheckOutcome::Completed(verdict) => {
            assert!(verdict.overall_violation.is_yes());
            assert_eq!(verdict.violated_elements_and_reasons.len(), 1);
        }
        _ => panic!("2.4.9 should complete"),
    }
}

#[tokio::test]
async fn audit_persists_reports_and_timing() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(CountingFactory::new(true));
    let provider = Arc::new(TargetedProvider {
        violating_criterion: "2.4.9",
    });
    let scheduler = Scheduler::new(factory, provider);

    let report = scheduler
        .audit("http://localhost/", dir.path())
        .await
        .unwrap();
    assert_eq!(report.results.len(), criteria::registry().len());

    // Violation report for the flagged criterion.
    let flagged: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("2.4.9.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(flagged["overall_violation"], "Yes");

    // Failed script criteria leave visible error files.
    assert!(dir.path().join("1.4.3.error.json").exists());

    // The timing record is always written.
    let timing: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("time_consumed.json")).unwrap(),
    )
    .unwrap();
    assert!(timing["time_consumed_seconds"].as_f64().unwrap() >= 0.0);
}
