//! Vector index adapter
//!
//! Thin contract over any nearest-neighbor vector store: upsert, delete,
//! filtered search, collection bootstrap. The engine never talks to an index
//! except through [`VectorIndex`], so the in-process implementation in
//! [`in_memory`] and any remote store are interchangeable.
//!
//! Failure semantics: adapters surface every store failure to the caller and
//! perform no silent retries.

pub mod in_memory;

pub use in_memory::InMemoryIndex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::memory::types::{Category, FactKey, Memory, MemoryId};

/// The owning index record for a memory: payload plus its vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub memory: Memory,
    pub embedding: Vec<f32>,
}

/// A search hit with its similarity score in [0, 1]
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub memory: Memory,
    pub score: f32,
}

/// Extra exact-match filters for similarity search
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub category: Option<Category>,
}

/// One page of a non-similarity scan
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Memory>,
    /// Cursor for the next page; `None` when the scan is exhausted
    pub next_cursor: Option<usize>,
}

/// Contract over a nearest-neighbor vector store
pub trait VectorIndex: Send + Sync {
    /// Idempotent collection bootstrap; safe to call on every process start.
    /// Guarantees the collection exists with the given dimension and that
    /// exact-match lookups on user, category, and fact key are supported.
    fn ensure_collection(&self, dimension: usize) -> Result<()>;

    /// Insert or replace a record keyed by memory id. The record is
    /// searchable as soon as this returns.
    fn upsert(&self, record: IndexRecord) -> Result<()>;

    /// Remove records by id; ids that do not exist are a no-op, not an error
    fn delete(&self, ids: &[MemoryId]) -> Result<()>;

    /// Similarity search scoped server-side to one user, ordered by
    /// descending score. `score_threshold` is inclusive: a score exactly
    /// equal to the threshold is returned.
    fn search_by_vector(
        &self,
        user_id: &str,
        query: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredRecord>>;

    /// Non-similarity scan of one user's records, most recent first
    fn list_by_user(
        &self,
        user_id: &str,
        category: Option<Category>,
        page_size: usize,
        cursor: Option<usize>,
    ) -> Result<Page>;

    /// Lookup by identity key; at most one record by construction
    fn find_by_fact_key(&self, user_id: &str, fact_key: &FactKey) -> Result<Option<IndexRecord>>;
}
