//! Evidence Chunker
//!
//! Splits an evidence collection into token-budgeted chunks so that no
//! single completion request outgrows the model's context window. The
//! partition is lossless: every item lands in exactly one chunk, in its
//! original order.

use super::{EvidenceCollection, EvidenceItem};

/// Flat cost charged for an inline image, independent of payload size.
/// Vision endpoints bill screenshots at a roughly fixed tile rate.
const IMAGE_TOKEN_ESTIMATE: usize = 1024;

const APPROX_BYTES_PER_TOKEN: usize = 4;

/// Pluggable cost model. The chunker is agnostic to the tokenizer; the
/// default heuristic approximates one token per four bytes of text.
pub trait TokenEstimator: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;

    fn item_cost(&self, item: &EvidenceItem) -> usize {
        match item {
            EvidenceItem::Image { .. } => IMAGE_TOKEN_ESTIMATE,
            other => self.count_tokens(&other.render()),
        }
    }

    fn entry_cost(&self, key: &str, value: &str) -> usize {
        self.count_tokens(key) + self.count_tokens(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn count_tokens(&self, text: &str) -> usize {
        text.len().saturating_add(APPROX_BYTES_PER_TOKEN - 1) / APPROX_BYTES_PER_TOKEN
    }
}

/// Split `collection` into chunks whose estimated cost stays within
/// `max_chunk_tokens`, unless the whole collection already fits under
/// `threshold_tokens`, in which case it is returned unchanged as a single
/// chunk. A lone item costing more than the budget still becomes its own
/// chunk; it is never dropped or split mid-item.
pub fn chunk_collection(
    collection: EvidenceCollection,
    estimator: &dyn TokenEstimator,
    threshold_tokens: usize,
    max_chunk_tokens: usize,
) -> Vec<EvidenceCollection> {
    if collection.is_empty() {
        return Vec::new();
    }

    let total = total_tokens(&collection, estimator);
    if total <= threshold_tokens {
        return vec![collection];
    }

    match collection {
        EvidenceCollection::Mapping(entries) => {
            greedy_split(entries, max_chunk_tokens, |(k, v)| estimator.entry_cost(k, v))
                .into_iter()
                .map(EvidenceCollection::Mapping)
                .collect()
        }
        EvidenceCollection::Sequence(items) => {
            greedy_split(items, max_chunk_tokens, |item| estimator.item_cost(item))
                .into_iter()
                .map(EvidenceCollection::Sequence)
                .collect()
        }
    }
}

pub fn total_tokens(collection: &EvidenceCollection, estimator: &dyn TokenEstimator) -> usize {
    match collection {
        EvidenceCollection::Mapping(entries) => entries
            .iter()
            .map(|(k, v)| estimator.entry_cost(k, v))
            .sum(),
        EvidenceCollection::Sequence(items) => {
            items.iter().map(|item| estimator.item_cost(item)).sum()
        }
    }
}

/// Greedy accumulation in natural order: close the current chunk when the
/// next item would push the running estimate past the budget, then start a
/// fresh chunk with that item. The final partial chunk is always flushed.
fn greedy_split<T>(items: Vec<T>, max_tokens: usize, cost: impl Fn(&T) -> usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut current_tokens = 0usize;

    for item in items {
        let item_tokens = cost(&item);
        if !current.is_empty() && current_tokens + item_tokens > max_tokens {
            chunks.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current_tokens += item_tokens;
        current.push(item);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
