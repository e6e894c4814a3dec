//! Verdict Model
//!
//! The canonical structured judgment the completion collaborator is asked
//! to produce for every evidence chunk, plus the parse / repair / merge
//! pipeline that turns raw model output into one report per criterion.

mod repair;

pub use repair::repair_json;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Wire-level boolean: the completion schema constrains the model to the
/// literal strings "Yes" and "No".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn is_yes(&self) -> bool {
        matches!(self, YesNo::Yes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolatedElement {
    /// outerHTML of the offending element, opening tag only.
    pub element: String,
    /// Reason and recommendation default to empty so a response truncated
    /// right after the element snippet still yields a usable entry.
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub recommendation: String,
}

/// One structured judgment, for a single chunk or for the merged whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub overall_violation: YesNo,
    #[serde(default)]
    pub violated_elements_and_reasons: Vec<ViolatedElement>,
}

impl Verdict {
    pub fn no_violation() -> Self {
        Self {
            overall_violation: YesNo::No,
            violated_elements_and_reasons: Vec::new(),
        }
    }

    /// A verdict is empty when it reports nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        !self.overall_violation.is_yes() && self.violated_elements_and_reasons.is_empty()
    }
}

/// Strict parse, then one repair attempt, then give up. Callers drop the
/// response on `None`; a malformed chunk must not abort its siblings.
pub fn parse_verdict(raw: &str) -> Option<Verdict> {
    if let Ok(v) = serde_json::from_str::<Verdict>(raw) {
        return Some(v);
    }
    let repaired = repair_json(raw);
    serde_json::from_str::<Verdict>(&repaired).ok()
}

/// Merge raw chunk responses, in chunk order, into one verdict.
///
/// The merged violation flag is Yes iff any parsed response says Yes, and
/// the violation lists concatenate without de-duplication so that no
/// reported evidence is lost. Responses that stay malformed after repair
/// are logged and skipped; if nothing parses at all the result is a clean
/// no-violation verdict rather than a hard failure.
pub fn aggregate(responses: &[String]) -> Verdict {
    let mut merged = Verdict::no_violation();

    for (idx, raw) in responses.iter().enumerate() {
        match parse_verdict(raw) {
            Some(verdict) => {
                if verdict.overall_violation.is_yes() {
                    merged.overall_violation = YesNo::Yes;
                    merged
                        .violated_elements_and_reasons
                        .extend(verdict.violated_elements_and_reasons);
                }
            }
            None => {
                warn!(chunk = idx, "dropping unparsable chunk response");
            }
        }
    }

    merged
}
