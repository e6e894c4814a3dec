//! Evidence Model
//!
//! The DOM/visual facts gathered for one criterion before chunking.
//! Collections are built once by an extractor and only ever partitioned
//! afterwards, never mutated.

mod chunker;

pub use chunker::{chunk_collection, HeuristicEstimator, TokenEstimator};

use serde::{Deserialize, Serialize};

/// A single piece of evidence inside an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceItem {
    /// Plain serialized text (outerHTML, computed styles, probe output).
    Text(String),
    /// Inline screenshot payload.
    Image { media_type: String, base64: String },
    /// Composite record: a labelled group of key/value facts.
    Record {
        label: String,
        fields: Vec<(String, String)>,
    },
}

impl EvidenceItem {
    /// Render the textual face of the item for prompting and token
    /// estimation. Images are costed separately by the estimator.
    pub fn render(&self) -> String {
        match self {
            EvidenceItem::Text(t) => t.clone(),
            EvidenceItem::Image { media_type, .. } => format!("[inline image: {}]", media_type),
            EvidenceItem::Record { label, fields } => {
                let mut out = format!("{}:\n", label);
                for (k, v) in fields {
                    out.push_str(&format!("  {}: {}\n", k, v));
                }
                out
            }
        }
    }
}

/// Evidence for one criterion: either an insertion-ordered mapping from an
/// element key to its serialized representation, or an ordered sequence of
/// heterogeneous items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCollection {
    Mapping(Vec<(String, String)>),
    Sequence(Vec<EvidenceItem>),
}

impl EvidenceCollection {
    pub fn len(&self) -> usize {
        match self {
            EvidenceCollection::Mapping(entries) => entries.len(),
            EvidenceCollection::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn empty_sequence() -> Self {
        EvidenceCollection::Sequence(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_render_includes_fields() {
        let item = EvidenceItem::Record {
            label: "link".to_string(),
            fields: vec![("href".to_string(), "/about".to_string())],
        };
        let rendered = item.render();
        assert!(rendered.contains("link:"));
        assert!(rendered.contains("href: /about"));
    }

    #[test]
    fn test_collection_len() {
        let c = EvidenceCollection::Mapping(vec![
            ("<img src=\"a.png\">".to_string(), "alt missing".to_string()),
            ("<img src=\"b.png\">".to_string(), "alt=\"logo\"".to_string()),
        ]);
        assert_eq!(c.len(), 2);
        assert!(!c.is_empty());
        assert!(EvidenceCollection::empty_sequence().is_empty());
    }
}
