//! Generation collaborator interface
//!
//! The engine never decides replies itself: a [`Generator`] consumes the
//! utterance, the conversation transcript, and the grounding memories, and
//! returns the reply plus a save decision. [`OllamaGenerator`] talks to any
//! OpenAI-compatible chat completions endpoint (Ollama by default).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::Memory;

/// One turn of the conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Input to the generation collaborator
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub utterance: String,
    /// Prior turns, oldest first, excluding the current utterance
    pub transcript: Vec<ChatMessage>,
    /// Memories retrieved to ground the reply
    pub grounding: Vec<Memory>,
}

/// Output of the generation collaborator: the reply plus the save decision
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResult {
    #[serde(alias = "reply", alias = "response")]
    pub reply_text: String,
    #[serde(default)]
    pub save_memory: bool,
    #[serde(default)]
    pub extracted_statement: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub fact_key: Option<String>,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> anyhow::Result<GenerationResult>;
}

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

const SYSTEM_PROMPT: &str = "\
You are Nova, a helpful assistant with long-term memory about the user. \
Ground your reply in the MEMORIES section when relevant. \
Respond with a single JSON object and nothing else, with fields: \
\"reply_text\" (string, your reply to the user), \
\"save_memory\" (boolean, true only if the user stated a durable fact about \
themselves worth remembering), \
\"extracted_statement\" (string, the fact restated in third person, required \
when save_memory is true), \
\"categories\" (array of strings drawn from personal_details, \
user_preferences, projects, routines, meta, general), \
\"fact_key\" (optional dotted identifier such as profile.location.current \
when the fact is the current value of a stable attribute, omit otherwise).";

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: Option<String>, model: String) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            http_client: reqwest::Client::new(),
        }
    }

    fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.transcript.len() + 2);

        let mut system = String::from(SYSTEM_PROMPT);
        if !request.grounding.is_empty() {
            system.push_str("\n\nMEMORIES:");
            for memory in &request.grounding {
                system.push_str(&format!("\n- {}", memory.memory_text));
            }
        }
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system,
        });

        messages.extend(request.transcript.iter().cloned());
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.utterance.clone(),
        });
        messages
    }

    /// Parse the model's JSON envelope; degrade to reply-only on any failure
    fn parse_result(content: &str) -> GenerationResult {
        let candidate = match (content.find('{'), content.rfind('}')) {
            (Some(start), Some(end)) if start < end => &content[start..=end],
            _ => content,
        };

        match serde_json::from_str::<GenerationResult>(candidate) {
            Ok(result) if !result.reply_text.trim().is_empty() => result,
            _ => {
                debug!("generation output was not a valid envelope, using raw reply");
                GenerationResult {
                    reply_text: content.trim().to_string(),
                    ..Default::default()
                }
            }
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, request: GenerationRequest) -> anyhow::Result<GenerationResult> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(&request),
            temperature: None,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("generation request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("generation endpoint returned {status}: {detail}");
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("invalid generation response: {e}"))?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();

        Ok(Self::parse_result(content))
    }
}
