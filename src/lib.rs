//! Nova-Memory Library
//!
//! Long-term memory engine for conversational agents:
//! - Vector-indexed facts with identity-key supersession
//! - Similarity-threshold deduplication for free-form facts
//! - Natural-language management commands (list/search/count/forget/clear)
//! - Grounding retrieval and a save-decision extraction gate around an
//!   external generation collaborator

pub mod chat;
pub mod commands;
pub mod config;
pub mod constants;
pub mod embeddings;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod index;
pub mod memory;
pub mod retrieval;
pub mod similarity;
pub mod validation;

// Re-export dependencies to ensure tests use the same version
pub use chrono;
pub use uuid;
