//! Extraction gate
//!
//! The generator decides *whether* to remember; this gate only validates the
//! extracted payload before handing it to the store. Malformed payloads are
//! logged and dropped; the turn still succeeds with its reply.

use tracing::warn;

use crate::generation::GenerationResult;
use crate::memory::types::{Category, FactKey, MemoryCandidate};
use crate::memory::{MemoryStore, SaveOutcome};
use crate::validation;

/// Validate the generation payload and forward it to the store
///
/// Returns `None` when the generator declined to save, the payload was
/// malformed, or the save itself failed; none of these fail the turn.
pub fn apply_save_decision(
    store: &MemoryStore,
    user_id: &str,
    result: &GenerationResult,
) -> Option<SaveOutcome> {
    if !result.save_memory {
        return None;
    }

    let candidate = match validate_payload(user_id, result) {
        Ok(candidate) => candidate,
        Err(reason) => {
            warn!(user_id, %reason, "dropping malformed extraction payload");
            return None;
        }
    };

    match store.save(candidate) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!(user_id, error = %e, "failed to save extracted memory");
            None
        }
    }
}

fn validate_payload(
    user_id: &str,
    result: &GenerationResult,
) -> Result<MemoryCandidate, anyhow::Error> {
    let statement = result
        .extracted_statement
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    validation::validate_content(statement)?;

    // At least one valid ontology tag; absent defaults to general, but a
    // present list with no recognizable tag is malformed
    let categories = match &result.categories {
        None => vec![Category::General],
        Some(raw) => {
            let parsed: Vec<Category> = raw.iter().filter_map(|s| Category::parse(s)).collect();
            if parsed.is_empty() {
                anyhow::bail!("no valid category in {raw:?}");
            }
            parsed
        }
    };

    let fact_key = match result.fact_key.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(FactKey::parse(raw)?),
    };

    Ok(MemoryCandidate {
        user_id: user_id.to_string(),
        memory_text: statement.to_string(),
        categories,
        fact_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationResult;

    fn payload(statement: Option<&str>) -> GenerationResult {
        GenerationResult {
            reply_text: "ok".to_string(),
            save_memory: true,
            extracted_statement: statement.map(String::from),
            categories: None,
            fact_key: None,
        }
    }

    #[test]
    fn test_validate_defaults_to_general_category() {
        let candidate = validate_payload("u1", &payload(Some("User likes pizza"))).unwrap();
        assert_eq!(candidate.categories, vec![Category::General]);
        assert!(candidate.fact_key.is_none());
    }

    #[test]
    fn test_validate_rejects_empty_statement() {
        assert!(validate_payload("u1", &payload(None)).is_err());
        assert!(validate_payload("u1", &payload(Some("   "))).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_categories_only() {
        let mut result = payload(Some("User likes pizza"));
        result.categories = Some(vec!["nonsense".to_string()]);
        assert!(validate_payload("u1", &result).is_err());

        result.categories = Some(vec!["nonsense".to_string(), "projects".to_string()]);
        let candidate = validate_payload("u1", &result).unwrap();
        assert_eq!(candidate.categories, vec![Category::Projects]);
    }

    #[test]
    fn test_validate_rejects_malformed_fact_key() {
        let mut result = payload(Some("User lives in Berlin"));
        result.fact_key = Some("not a key!".to_string());
        assert!(validate_payload("u1", &result).is_err());

        result.fact_key = Some("profile.location.current".to_string());
        let candidate = validate_payload("u1", &result).unwrap();
        assert_eq!(
            candidate.fact_key.unwrap().as_str(),
            "profile.location.current"
        );
    }
}
