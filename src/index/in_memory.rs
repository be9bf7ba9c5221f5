//! In-process vector index
//!
//! Brute-force cosine scan over records held in a concurrent map. Suits the
//! per-user memory counts this engine sees (hundreds, not millions); a
//! remote ANN store would implement the same trait.

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;

use crate::memory::types::{Category, FactKey, Memory, MemoryId};
use crate::similarity::cosine_similarity;

use super::{IndexRecord, Page, ScoredRecord, SearchFilter, VectorIndex};

pub struct InMemoryIndex {
    /// Collection dimension, fixed by the first ensure_collection call
    dimension: RwLock<Option<usize>>,
    records: DashMap<MemoryId, IndexRecord>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            dimension: RwLock::new(None),
            records: DashMap::new(),
        }
    }

    fn expect_dimension(&self) -> Result<usize> {
        (*self.dimension.read())
            .ok_or_else(|| anyhow!("collection not initialized; call ensure_collection first"))
    }

    /// Snapshot of one user's records, optionally filtered by category
    fn user_records(&self, user_id: &str, category: Option<Category>) -> Vec<IndexRecord> {
        self.records
            .iter()
            .filter(|entry| entry.memory.user_id == user_id)
            .filter(|entry| match category {
                Some(c) => entry.memory.categories.contains(&c),
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex for InMemoryIndex {
    fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let mut dim = self.dimension.write();
        match *dim {
            None => {
                *dim = Some(dimension);
                Ok(())
            }
            Some(existing) if existing == dimension => Ok(()),
            Some(existing) => Err(anyhow!(
                "collection already exists with dimension {existing}, requested {dimension}"
            )),
        }
    }

    fn upsert(&self, record: IndexRecord) -> Result<()> {
        let dimension = self.expect_dimension()?;
        if record.embedding.len() != dimension {
            return Err(anyhow!(
                "record embedding dimension {} does not match collection dimension {}",
                record.embedding.len(),
                dimension
            ));
        }

        self.records.insert(record.memory.id, record);
        Ok(())
    }

    fn delete(&self, ids: &[MemoryId]) -> Result<()> {
        for id in ids {
            self.records.remove(id);
        }
        Ok(())
    }

    fn search_by_vector(
        &self,
        user_id: &str,
        query: &[f32],
        top_k: usize,
        score_threshold: Option<f32>,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredRecord>> {
        self.expect_dimension()?;

        let mut scored: Vec<(OrderedFloat<f32>, Memory)> = self
            .user_records(user_id, filter.category)
            .into_iter()
            .map(|record| {
                let score = cosine_similarity(query, &record.embedding);
                (OrderedFloat(score), record.memory)
            })
            .filter(|(score, _)| match score_threshold {
                Some(t) => score.0 >= t,
                None => true,
            })
            .collect();

        // Sort by score descending
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, memory)| ScoredRecord {
                memory,
                score: score.0,
            })
            .collect())
    }

    fn list_by_user(
        &self,
        user_id: &str,
        category: Option<Category>,
        page_size: usize,
        cursor: Option<usize>,
    ) -> Result<Page> {
        let mut memories: Vec<Memory> = self
            .user_records(user_id, category)
            .into_iter()
            .map(|record| record.memory)
            .collect();

        // Most recent first; id as tiebreaker for a stable scan order
        memories.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = cursor.unwrap_or(0);
        let end = (offset + page_size).min(memories.len());
        let next_cursor = if end < memories.len() { Some(end) } else { None };
        let records = memories
            .get(offset..end)
            .map(|slice| slice.to_vec())
            .unwrap_or_default();

        Ok(Page {
            records,
            next_cursor,
        })
    }

    fn find_by_fact_key(&self, user_id: &str, fact_key: &FactKey) -> Result<Option<IndexRecord>> {
        Ok(self
            .records
            .iter()
            .find(|entry| entry.memory.user_id == user_id && &entry.memory.fact_key == fact_key)
            .map(|entry| entry.value().clone()))
    }
}
