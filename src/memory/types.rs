//! Type definitions for the memory system

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::constants::SENTINEL_FACT_KEY;

/// Unique identifier for memories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)] // Serialize as plain UUID string, not array
pub struct MemoryId(pub Uuid);

impl MemoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed category ontology for stored facts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PersonalDetails,
    UserPreferences,
    Projects,
    Routines,
    Meta,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::PersonalDetails,
        Category::UserPreferences,
        Category::Projects,
        Category::Routines,
        Category::Meta,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PersonalDetails => "personal_details",
            Category::UserPreferences => "user_preferences",
            Category::Projects => "projects",
            Category::Routines => "routines",
            Category::Meta => "meta",
            Category::General => "general",
        }
    }

    /// Parse an ontology tag; unknown tags are rejected
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "personal_details" => Some(Category::PersonalDetails),
            "user_preferences" => Some(Category::UserPreferences),
            "projects" => Some(Category::Projects),
            "routines" => Some(Category::Routines),
            "meta" => Some(Category::Meta),
            "general" => Some(Category::General),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// De-duplicate a category list preserving first-occurrence order
pub fn dedup_categories(categories: Vec<Category>) -> Vec<Category> {
    let mut seen = Vec::with_capacity(categories.len());
    for c in categories {
        if !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}

/// Stable dotted identity string for a fact
///
/// A non-sentinel key (e.g. `profile.location.current`) asserts "this is the
/// current value of a named fact": saving under the same key supersedes the
/// prior memory. The sentinel `other.misc` marks a free-form fact with no
/// identity-based uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactKey(String);

impl FactKey {
    /// Parse and validate a dotted identifier: at least two segments of
    /// `[a-z0-9_]`, joined by single dots
    pub fn parse(s: &str) -> Result<FactKey> {
        let s = s.trim();
        let segments: Vec<&str> = s.split('.').collect();

        if segments.len() < 2 {
            return Err(anyhow!(
                "fact_key must have at least two dotted segments, got '{s}'"
            ));
        }

        for segment in &segments {
            if segment.is_empty() {
                return Err(anyhow!("fact_key has an empty segment: '{s}'"));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(anyhow!(
                    "fact_key segment '{segment}' contains invalid characters (allowed: a-z, 0-9, _)"
                ));
            }
        }

        Ok(FactKey(s.to_string()))
    }

    /// The sentinel key marking a free-form memory
    pub fn sentinel() -> FactKey {
        FactKey(SENTINEL_FACT_KEY.to_string())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_FACT_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FactKey {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single stored fact about a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub user_id: String,
    pub memory_text: String,
    pub categories: Vec<Category>,
    pub fact_key: FactKey,
    pub created_at: DateTime<Utc>,
}

impl Memory {
    pub fn new(
        user_id: impl Into<String>,
        memory_text: impl Into<String>,
        categories: Vec<Category>,
        fact_key: FactKey,
    ) -> Self {
        let mut categories = dedup_categories(categories);
        if categories.is_empty() {
            categories.push(Category::General);
        }

        Self {
            id: MemoryId::new(),
            user_id: user_id.into(),
            memory_text: memory_text.into(),
            categories,
            fact_key,
            created_at: Utc::now(),
        }
    }
}

/// Candidate fact handed to the store for persistence
#[derive(Debug, Clone)]
pub struct MemoryCandidate {
    pub user_id: String,
    pub memory_text: String,
    pub categories: Vec<Category>,
    /// Absent means free-form (same as the sentinel)
    pub fact_key: Option<FactKey>,
}

/// Result of a save: the final stored record plus whether a write occurred
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub memory: Memory,
    /// False when the save was suppressed as a near-duplicate
    pub newly_written: bool,
}

/// Result of a semantic forget
#[derive(Debug, Clone, Serialize)]
pub struct ForgetOutcome {
    pub deleted: usize,
    /// Texts of the deleted memories, for user-facing confirmation
    pub texts: Vec<String>,
}

/// Total memory count with per-category breakdown
///
/// A memory with N categories contributes to N buckets; `total` counts
/// distinct memories.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryCounts {
    pub total: usize,
    pub by_category: BTreeMap<Category, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_key_accepts_dotted_identifiers() {
        assert!(FactKey::parse("profile.location.current").is_ok());
        assert!(FactKey::parse("other.misc").is_ok());
        assert!(FactKey::parse("prefs.food_1").is_ok());
    }

    #[test]
    fn test_fact_key_rejects_malformed() {
        assert!(FactKey::parse("location").is_err());
        assert!(FactKey::parse("profile..location").is_err());
        assert!(FactKey::parse("Profile.Location").is_err());
        assert!(FactKey::parse("profile.loc ation").is_err());
        assert!(FactKey::parse("").is_err());
    }

    #[test]
    fn test_sentinel() {
        assert!(FactKey::sentinel().is_sentinel());
        assert!(FactKey::parse("other.misc").unwrap().is_sentinel());
        assert!(!FactKey::parse("profile.name").unwrap().is_sentinel());
    }

    #[test]
    fn test_category_roundtrip() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
        assert_eq!(Category::parse("unknown"), None);
    }

    #[test]
    fn test_memory_new_dedups_and_defaults_categories() {
        let m = Memory::new(
            "u1",
            "text",
            vec![Category::Projects, Category::Projects, Category::Meta],
            FactKey::sentinel(),
        );
        assert_eq!(m.categories, vec![Category::Projects, Category::Meta]);

        let m = Memory::new("u1", "text", vec![], FactKey::sentinel());
        assert_eq!(m.categories, vec![Category::General]);
    }
}
