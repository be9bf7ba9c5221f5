//! Memory entity lifecycle, identity-key resolution, and semantic dedup

pub mod store;
pub mod types;

pub use store::{MemoryStore, StoreConfig};
pub use types::{
    Category, FactKey, ForgetOutcome, Memory, MemoryCandidate, MemoryCounts, MemoryId,
    SaveOutcome,
};
