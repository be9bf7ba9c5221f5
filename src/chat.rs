//! Chat turn orchestration
//!
//! An inbound turn first passes through the command router; a matched
//! management intent executes against the store and the turn ends there.
//! Otherwise the retrieval pipeline fetches grounding memories, the
//! generation collaborator produces the reply plus a save decision, and the
//! extraction gate persists any resulting fact.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::commands;
use crate::errors::Result;
use crate::extraction;
use crate::generation::{ChatMessage, GenerationRequest, Generator};
use crate::memory::MemoryStore;
use crate::retrieval;

/// Reply shape is uniform regardless of which path produced it
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub role: String,
    pub content: String,
}

impl ChatReply {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Fallback when the generator returns an empty reply
const EMPTY_REPLY_FALLBACK: &str =
    "I'm having trouble formulating a response right now. Could you rephrase that?";

pub struct ChatEngine {
    store: Arc<MemoryStore>,
    generator: Arc<dyn Generator>,
    grounding_top_k: usize,
}

impl ChatEngine {
    pub fn new(
        store: Arc<MemoryStore>,
        generator: Arc<dyn Generator>,
        grounding_top_k: usize,
    ) -> Self {
        Self {
            store,
            generator,
            grounding_top_k,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Handle one chat turn for a user
    ///
    /// `transcript` holds the prior turns oldest-first; `utterance` is the
    /// current user message.
    pub async fn handle_turn(
        &self,
        user_id: &str,
        utterance: &str,
        transcript: Vec<ChatMessage>,
    ) -> Result<ChatReply> {
        // Step 0: management commands short-circuit the turn
        if let Some(intent) = commands::detect(utterance) {
            info!(user_id, ?intent, "memory command detected");
            let content = commands::execute(&self.store, user_id, intent)?;
            return Ok(ChatReply::assistant(content));
        }

        // Step 1: grounding retrieval
        let grounding =
            retrieval::fetch_relevant(&self.store, user_id, utterance, self.grounding_top_k)?;

        // Step 2: generation
        let result = self
            .generator
            .generate(GenerationRequest {
                utterance: utterance.to_string(),
                transcript,
                grounding,
            })
            .await
            .map_err(crate::errors::AppError::from)?;

        let reply_text = if result.reply_text.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            result.reply_text.trim().to_string()
        };

        // Step 3: persist the extracted fact, if any
        if let Some(outcome) = extraction::apply_save_decision(&self.store, user_id, &result) {
            debug!(
                user_id,
                memory_id = %outcome.memory.id,
                newly_written = outcome.newly_written,
                "save decision applied"
            );
        }

        Ok(ChatReply::assistant(reply_text))
    }
}
