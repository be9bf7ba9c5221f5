//! Shared test helpers: a canned-vector embedder so similarity scores are
//! exact, plus store construction shortcuts.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use nova_memory::embeddings::Embedder;
use nova_memory::index::InMemoryIndex;
use nova_memory::memory::{Category, FactKey, MemoryCandidate, MemoryStore, StoreConfig};

pub const DIM: usize = 4;

/// Embedder returning pre-registered vectors; unknown text is an error so a
/// test can't accidentally rely on an unregistered similarity
pub struct StaticEmbedder {
    map: HashMap<String, Vec<f32>>,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), DIM);
        self.map.insert(text.to_string(), vector);
        self
    }
}

impl Embedder for StaticEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.map
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow!("no canned embedding registered for '{text}'"))
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Unit base vector; every other helper vector is measured against this
pub fn base() -> Vec<f32> {
    vec![1.0, 0.0, 0.0, 0.0]
}

/// Unit vector whose cosine against `base()` is approximately `c`
pub fn at_cos(c: f32) -> Vec<f32> {
    vec![c, (1.0 - c * c).sqrt(), 0.0, 0.0]
}

/// Unit vector orthogonal to `base()`
pub fn orthogonal(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[axis] = 1.0;
    v
}

pub fn store_with(embedder: StaticEmbedder, config: StoreConfig) -> MemoryStore {
    let store = MemoryStore::new(
        Arc::new(InMemoryIndex::new()),
        Arc::new(embedder),
        config,
    );
    store.bootstrap().expect("bootstrap");
    store
}

pub fn config(duplicate_threshold: f32, forget_threshold: f32) -> StoreConfig {
    StoreConfig {
        embedding_dimension: DIM,
        duplicate_threshold,
        forget_threshold,
    }
}

pub fn candidate(user_id: &str, text: &str, fact_key: Option<&str>) -> MemoryCandidate {
    MemoryCandidate {
        user_id: user_id.to_string(),
        memory_text: text.to_string(),
        categories: vec![Category::General],
        fact_key: fact_key.map(|k| FactKey::parse(k).expect("valid fact key")),
    }
}
