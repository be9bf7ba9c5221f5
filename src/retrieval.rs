//! Grounding retrieval for chat turns
//!
//! Best-effort top-K: no score threshold, and an empty store yields an empty
//! sequence rather than an error, so a turn never fails for lack of
//! memories.

use tracing::debug;

use crate::errors::Result;
use crate::memory::{Memory, MemoryStore};

/// Fetch up to `top_k` memories relevant to the utterance
pub fn fetch_relevant(
    store: &MemoryStore,
    user_id: &str,
    utterance: &str,
    top_k: usize,
) -> Result<Vec<Memory>> {
    let hits = store.search(user_id, utterance, top_k)?;
    debug!(user_id, found = hits.len(), "fetched grounding memories");
    Ok(hits.into_iter().map(|h| h.memory).collect())
}
