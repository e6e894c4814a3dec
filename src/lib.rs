//! LLM-driven WCAG 2.2 Auditor
//!
//! Audits a rendered web page against ~30 accessibility success criteria
//! by fanning every criterion out as an isolated check: gather DOM and
//! visual evidence through a browser session, split it into
//! token-budgeted chunks, ask a vision-capable completion endpoint for a
//! structured verdict per chunk, and merge the verdicts into one report
//! per criterion.

pub mod browser;
pub mod check;
pub mod config;
pub mod criteria;
pub mod evidence;
pub mod llm;
pub mod scheduler;
pub mod verdict;

// Re-exports for convenience
pub use check::{CheckOutcome, CheckResult, TokenBudget};
pub use criteria::Criterion;
pub use scheduler::Scheduler;
pub use verdict::Verdict;
