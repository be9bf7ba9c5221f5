//! Input validation for requests and extracted payloads

use anyhow::{anyhow, Result};

/// Maximum lengths
pub const MAX_USER_ID_LENGTH: usize = 128;
pub const MAX_MEMORY_TEXT_LENGTH: usize = 10_000;

/// Validate user_id
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(anyhow!("user_id cannot be empty"));
    }

    if user_id.len() > MAX_USER_ID_LENGTH {
        return Err(anyhow!(
            "user_id too long: {} chars (max: {})",
            user_id.len(),
            MAX_USER_ID_LENGTH
        ));
    }

    // Only allow alphanumeric, dash, underscore, @, .
    if !user_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '@' || c == '.')
    {
        return Err(anyhow!(
            "user_id contains invalid characters (allowed: alphanumeric, -, _, @, .)"
        ));
    }

    Ok(())
}

/// Validate memory text / utterance content
pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(anyhow!("content cannot be empty"));
    }

    if content.len() > MAX_MEMORY_TEXT_LENGTH {
        return Err(anyhow!(
            "content too long: {} chars (max: {})",
            content.len(),
            MAX_MEMORY_TEXT_LENGTH
        ));
    }

    Ok(())
}

/// Validate an embedding vector against the configured dimension
pub fn validate_embedding(embedding: &[f32], expected_dimension: usize) -> Result<()> {
    if embedding.len() != expected_dimension {
        return Err(anyhow!(
            "embedding dimension mismatch: got {}, expected {}",
            embedding.len(),
            expected_dimension
        ));
    }

    if embedding.iter().any(|&v| !v.is_finite()) {
        return Err(anyhow!("embedding contains NaN or Inf values"));
    }

    Ok(())
}

/// Validate top_k for search requests
pub fn validate_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(anyhow!("top_k must be greater than 0"));
    }

    if top_k > 1_000 {
        return Err(anyhow!("top_k too large: {top_k} (max: 1,000)"));
    }

    Ok(())
}
