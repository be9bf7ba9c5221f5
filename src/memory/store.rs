//! Memory store: identity and deduplication semantics around raw CRUD
//!
//! Identity-keyed facts model "current truth" and always win on resupply;
//! free-form facts have no natural key, so near-duplicate text is suppressed
//! by meaning rather than exact string match.
//!
//! There is no cross-request locking: two concurrent saves for the same
//! (user_id, fact_key) can both observe "no existing record" and briefly
//! leave two records for the key. Known property, see DESIGN.md.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::{
    DEDUP_SCAN_TOP_K, DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_FORGET_THRESHOLD, FORGET_SCAN_CAP, LIST_PAGE_SIZE,
};
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result, ValidationErrorExt};
use crate::index::{IndexRecord, ScoredRecord, SearchFilter, VectorIndex};
use crate::memory::types::{
    Category, ForgetOutcome, Memory, MemoryCandidate, MemoryCounts, SaveOutcome,
};
use crate::validation;

/// Threshold configuration, passed in explicitly so tests can vary it per case
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Embedding dimension, fixed process-wide; must match the index
    pub embedding_dimension: usize,
    /// Minimum similarity at which a free-form save is a duplicate (inclusive)
    pub duplicate_threshold: f32,
    /// Minimum similarity at which forget deletes a memory (inclusive)
    pub forget_threshold: f32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            forget_threshold: DEFAULT_FORGET_THRESHOLD,
        }
    }
}

pub struct MemoryStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: StoreConfig,
}

fn store_err(err: anyhow::Error) -> AppError {
    AppError::StoreUnavailable(err.to_string())
}

impl MemoryStore {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, config: StoreConfig) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Idempotent collection bootstrap; call on every process start
    pub fn bootstrap(&self) -> Result<()> {
        self.index
            .ensure_collection(self.config.embedding_dimension)
            .map_err(store_err)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .embedder
            .encode(text)
            .map_err(|e| AppError::EmbeddingFailure(e.to_string()))?;
        validation::validate_embedding(&embedding, self.config.embedding_dimension)
            .map_err(|e| AppError::EmbeddingFailure(e.to_string()))?;
        Ok(embedding)
    }

    /// Persist a candidate fact
    ///
    /// A non-sentinel fact key takes the identity-overwrite path: the new
    /// record is inserted first, then the superseded one is deleted, so a
    /// stable fact key never has a window with zero records. Free-form
    /// candidates are suppressed as duplicates when any existing memory
    /// scores at or above the duplicate threshold.
    pub fn save(&self, candidate: MemoryCandidate) -> Result<SaveOutcome> {
        let embedding = self.embed(&candidate.memory_text)?;
        let fact_key = candidate.fact_key.unwrap_or_default();

        if !fact_key.is_sentinel() {
            let prior = self
                .index
                .find_by_fact_key(&candidate.user_id, &fact_key)
                .map_err(store_err)?;

            let memory = Memory::new(
                &candidate.user_id,
                &candidate.memory_text,
                candidate.categories,
                fact_key.clone(),
            );
            self.index
                .upsert(IndexRecord {
                    memory: memory.clone(),
                    embedding,
                })
                .map_err(store_err)?;

            if let Some(prior) = prior {
                // The new value is already searchable; a failure here can
                // leave the key briefly duplicated but never absent.
                self.index.delete(&[prior.memory.id]).map_err(store_err)?;
                info!(
                    user_id = %memory.user_id,
                    fact_key = %fact_key,
                    superseded = %prior.memory.id,
                    "identity overwrite"
                );
            }

            return Ok(SaveOutcome {
                memory,
                newly_written: true,
            });
        }

        // Free-form fact: semantic dedup
        let hits = self
            .index
            .search_by_vector(
                &candidate.user_id,
                &embedding,
                DEDUP_SCAN_TOP_K,
                Some(self.config.duplicate_threshold),
                &SearchFilter::default(),
            )
            .map_err(store_err)?;

        if let Some(existing) = hits.into_iter().next() {
            debug!(
                user_id = %candidate.user_id,
                existing = %existing.memory.id,
                "near-duplicate save suppressed"
            );
            return Ok(SaveOutcome {
                memory: existing.memory,
                newly_written: false,
            });
        }

        let memory = Memory::new(
            &candidate.user_id,
            &candidate.memory_text,
            candidate.categories,
            fact_key,
        );
        self.index
            .upsert(IndexRecord {
                memory: memory.clone(),
                embedding,
            })
            .map_err(store_err)?;

        Ok(SaveOutcome {
            memory,
            newly_written: true,
        })
    }

    /// Semantic delete: remove every memory matching the target text at or
    /// above the forget threshold. Zero matches is a normal outcome.
    pub fn forget(&self, user_id: &str, target_text: &str) -> Result<ForgetOutcome> {
        let embedding = self.embed(target_text)?;

        let hits = self
            .index
            .search_by_vector(
                user_id,
                &embedding,
                FORGET_SCAN_CAP,
                Some(self.config.forget_threshold),
                &SearchFilter::default(),
            )
            .map_err(store_err)?;

        if hits.is_empty() {
            return Ok(ForgetOutcome {
                deleted: 0,
                texts: Vec::new(),
            });
        }

        let ids: Vec<_> = hits.iter().map(|h| h.memory.id).collect();
        let texts: Vec<_> = hits.into_iter().map(|h| h.memory.memory_text).collect();
        self.index.delete(&ids).map_err(store_err)?;

        info!(user_id, deleted = ids.len(), "forgot memories");
        Ok(ForgetOutcome {
            deleted: ids.len(),
            texts,
        })
    }

    /// Unconditionally delete every memory owned by the user. Irreversible.
    pub fn clear_all(&self, user_id: &str) -> Result<usize> {
        let mut deleted = 0;
        loop {
            let page = self
                .index
                .list_by_user(user_id, None, LIST_PAGE_SIZE, None)
                .map_err(store_err)?;
            if page.records.is_empty() {
                break;
            }

            let ids: Vec<_> = page.records.iter().map(|m| m.id).collect();
            self.index.delete(&ids).map_err(store_err)?;
            deleted += ids.len();
        }

        info!(user_id, deleted, "cleared all memories");
        Ok(deleted)
    }

    /// All memories for the user, grouped by category with fan-out for
    /// multi-category memories, each group most recent first
    pub fn list(
        &self,
        user_id: &str,
        category: Option<Category>,
    ) -> Result<BTreeMap<Category, Vec<Memory>>> {
        let mut groups: BTreeMap<Category, Vec<Memory>> = BTreeMap::new();

        for memory in self.scan_all(user_id, category)? {
            for c in &memory.categories {
                if category.is_some_and(|wanted| wanted != *c) {
                    continue;
                }
                groups.entry(*c).or_default().push(memory.clone());
            }
        }

        Ok(groups)
    }

    /// Ranked similarity matches, no threshold: best-effort top-K even when
    /// every score is low
    pub fn search(&self, user_id: &str, query: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        validation::validate_top_k(top_k).map_validation_err("top_k")?;
        let embedding = self.embed(query)?;
        self.index
            .search_by_vector(user_id, &embedding, top_k, None, &SearchFilter::default())
            .map_err(store_err)
    }

    /// Total memory count plus per-category breakdown (fan-out over sets)
    pub fn count(&self, user_id: &str) -> Result<MemoryCounts> {
        let memories = self.scan_all(user_id, None)?;

        let mut by_category: BTreeMap<Category, usize> = BTreeMap::new();
        for memory in &memories {
            for c in &memory.categories {
                *by_category.entry(*c).or_insert(0) += 1;
            }
        }

        Ok(MemoryCounts {
            total: memories.len(),
            by_category,
        })
    }

    /// Drain the list scan into one vector, most recent first
    fn scan_all(&self, user_id: &str, category: Option<Category>) -> Result<Vec<Memory>> {
        let mut memories = Vec::new();
        let mut cursor = None;
        loop {
            let page = self
                .index
                .list_by_user(user_id, category, LIST_PAGE_SIZE, cursor)
                .map_err(store_err)?;
            memories.extend(page.records);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(memories)
    }
}
