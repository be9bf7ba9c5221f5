//! Memory management command router
//!
//! A single-pass classifier over the raw utterance, run before any retrieval
//! or generation. Pure pattern matching: an explicit ordered list of rules,
//! first match wins. Order matters: "forget everything" must hit the
//! clear-all rule before the generic forget rule can swallow it.

use crate::constants::SEARCH_COMMAND_TOP_K;
use crate::errors::Result;
use crate::memory::{Category, MemoryStore};

/// A detected memory-management intent
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Erase everything the user has stored
    ClearAll,
    /// Delete the memories matching a specific statement
    Forget { target: String },
    /// How many memories exist
    Count,
    /// Similarity search over stored memories
    Search { query: String },
    /// Enumerate stored memories, optionally one category
    List { category: Option<Category> },
}

type Rule = fn(&str) -> Option<Intent>;

/// Precedence order is part of the contract; see the router tests
const RULES: [Rule; 5] = [
    match_clear_all,
    match_forget,
    match_count,
    match_search,
    match_list,
];

/// Classify an utterance; `None` means no management intent and the turn
/// proceeds to retrieval + generation
pub fn detect(utterance: &str) -> Option<Intent> {
    let text = normalize(utterance);
    RULES.iter().find_map(|rule| rule(&text))
}

fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

const DELETE_VERBS: [&str; 6] = ["forget", "delete", "erase", "remove", "clear", "wipe"];

const TOTALITY_PHRASES: [&str; 6] = [
    "everything",
    "all my memories",
    "all memories",
    "all of my memories",
    "all your memories",
    "your entire memory",
];

/// Leading filler stripped before start-anchored matching
const POLITENESS_PREFIXES: [&str; 7] = [
    "please", "nova", "hey", "ok", "can you", "could you", "would you",
];

fn contains_word(text: &str, word: &str) -> bool {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|t| t == word)
}

fn mentions_memories(text: &str) -> bool {
    text.contains("memor") || text.contains("remember")
}

/// Strip politeness prefixes so delete verbs anchor to the request itself
fn strip_politeness(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        let mut stripped = false;
        for prefix in POLITENESS_PREFIXES {
            if let Some(after) = rest.strip_prefix(prefix) {
                if after.is_empty() || after.starts_with([' ', ',']) {
                    rest = after.trim_start_matches([' ', ',']);
                    stripped = true;
                }
            }
        }
        if !stripped {
            return rest;
        }
    }
}

fn match_clear_all(text: &str) -> Option<Intent> {
    let has_verb = DELETE_VERBS.iter().any(|v| contains_word(text, v));
    let has_totality = TOTALITY_PHRASES.iter().any(|p| text.contains(p));
    (has_verb && has_totality).then_some(Intent::ClearAll)
}

fn match_forget(text: &str) -> Option<Intent> {
    let rest = strip_politeness(text);

    for verb in DELETE_VERBS {
        if let Some(after) = rest.strip_prefix(verb) {
            if !after.starts_with(' ') {
                continue;
            }
            // "forget that I smoke" / "delete the memory about my job"
            let target = after
                .trim_start()
                .trim_start_matches("that ")
                .trim_start_matches("about ")
                .trim_start_matches("the memory about ")
                .trim_start_matches("the memory that ")
                .trim();
            if !target.is_empty() {
                return Some(Intent::Forget {
                    target: target.to_string(),
                });
            }
        }
    }
    None
}

fn match_count(text: &str) -> Option<Intent> {
    if !mentions_memories(text) {
        return None;
    }
    (text.contains("how many") || contains_word(text, "count")).then_some(Intent::Count)
}

const SEARCH_VERBS: [&str; 5] = ["search", "find", "look up", "look for", "recall"];

fn match_search(text: &str) -> Option<Intent> {
    if !mentions_memories(text) {
        return None;
    }

    // "what do you remember about X" / "do you remember X"
    for prefix in ["what do you remember about ", "do you remember "] {
        if let Some(topic) = text.strip_prefix(prefix) {
            let topic = topic.trim().trim_end_matches('?').trim();
            if !topic.is_empty() {
                return Some(Intent::Search {
                    query: topic.to_string(),
                });
            }
        }
    }

    let verb = *SEARCH_VERBS.iter().find(|v| text.contains(**v))?;

    // Prefer an explicit topic marker after the verb
    let after_verb = &text[text.find(verb)? + verb.len()..];
    for marker in [" about ", " for ", " on "] {
        if let Some(pos) = after_verb.find(marker) {
            let topic = after_verb[pos + marker.len()..].trim().trim_end_matches('?');
            if !topic.is_empty() {
                return Some(Intent::Search {
                    query: topic.to_string(),
                });
            }
        }
    }

    // Otherwise the remainder minus the memory words is the topic
    let topic = after_verb
        .split_whitespace()
        .filter(|w| !matches!(*w, "my" | "your" | "the" | "memories" | "memory" | "in"))
        .collect::<Vec<_>>()
        .join(" ");
    let topic = topic.trim_end_matches('?').trim();
    (!topic.is_empty()).then(|| Intent::Search {
        query: topic.to_string(),
    })
}

const LIST_TRIGGERS: [&str; 5] = [
    "list",
    "show",
    "enumerate",
    "what are",
    "what do you remember",
];

fn match_list(text: &str) -> Option<Intent> {
    if !mentions_memories(text) {
        return None;
    }
    if !LIST_TRIGGERS.iter().any(|t| text.contains(t)) {
        return None;
    }

    // Optional category narrowing: "list my project memories"
    let category = if text.contains("personal") {
        Some(Category::PersonalDetails)
    } else if text.contains("preference") {
        Some(Category::UserPreferences)
    } else if text.contains("project") {
        Some(Category::Projects)
    } else if text.contains("routine") {
        Some(Category::Routines)
    } else {
        None
    };

    Some(Intent::List { category })
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "memory"
    } else {
        "memories"
    }
}

/// Execute a matched intent against the store, producing the final
/// user-facing reply; the chat turn short-circuits here
pub fn execute(store: &MemoryStore, user_id: &str, intent: Intent) -> Result<String> {
    match intent {
        Intent::ClearAll => {
            let deleted = store.clear_all(user_id)?;
            if deleted == 0 {
                Ok("You don't have any memories stored, so there was nothing to clear.".to_string())
            } else {
                Ok(format!("Cleared {deleted} {}.", plural(deleted)))
            }
        }

        Intent::Forget { target } => {
            let outcome = store.forget(user_id, &target)?;
            if outcome.deleted == 0 {
                Ok("I couldn't find any memories matching that, so nothing was forgotten.".to_string())
            } else {
                let mut reply = format!("Forgot {} {}:", outcome.deleted, plural(outcome.deleted));
                for text in &outcome.texts {
                    reply.push_str(&format!("\n- {text}"));
                }
                Ok(reply)
            }
        }

        Intent::Count => {
            let counts = store.count(user_id)?;
            if counts.total == 0 {
                return Ok("You don't have any memories stored yet.".to_string());
            }
            let mut reply = format!("You have {} {}.", counts.total, plural(counts.total));
            for (category, count) in &counts.by_category {
                reply.push_str(&format!("\n- {category}: {count}"));
            }
            Ok(reply)
        }

        Intent::Search { query } => {
            let hits = store.search(user_id, &query, SEARCH_COMMAND_TOP_K)?;
            if hits.is_empty() {
                return Ok("No stored memories matched that search.".to_string());
            }
            let mut reply = format!("Here's what I remember about \"{query}\":");
            for (i, hit) in hits.iter().enumerate() {
                reply.push_str(&format!("\n{}. {}", i + 1, hit.memory.memory_text));
            }
            Ok(reply)
        }

        Intent::List { category } => {
            let groups = store.list(user_id, category)?;
            if groups.is_empty() {
                return Ok("You don't have any memories stored yet.".to_string());
            }
            let mut reply = String::from("Here's what I remember:");
            for (category, memories) in &groups {
                reply.push_str(&format!("\n\n{category}:"));
                for memory in memories {
                    reply.push_str(&format!("\n- {}", memory.memory_text));
                }
            }
            Ok(reply)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_politeness() {
        assert_eq!(strip_politeness("please forget my address"), "forget my address");
        assert_eq!(
            strip_politeness("hey nova, can you forget my address"),
            "forget my address"
        );
        assert_eq!(strip_politeness("forget my address"), "forget my address");
    }

    #[test]
    fn test_forget_extracts_target_after_filler() {
        assert_eq!(
            match_forget("forget that i smoke"),
            Some(Intent::Forget {
                target: "i smoke".to_string()
            })
        );
        assert_eq!(
            match_forget("delete the memory about my old job"),
            Some(Intent::Forget {
                target: "my old job".to_string()
            })
        );
    }

    #[test]
    fn test_forget_requires_leading_verb() {
        // Mid-sentence delete verbs are ordinary conversation
        assert_eq!(match_forget("i deleted a file at work today"), None);
        assert_eq!(match_forget("forgetting things is human"), None);
    }

    #[test]
    fn test_search_topic_markers() {
        assert_eq!(
            match_search("search your memories for pizza"),
            Some(Intent::Search {
                query: "pizza".to_string()
            })
        );
        assert_eq!(
            match_search("what do you remember about my job?"),
            Some(Intent::Search {
                query: "my job".to_string()
            })
        );
    }

    #[test]
    fn test_list_category_narrowing() {
        assert_eq!(
            match_list("list my project memories"),
            Some(Intent::List {
                category: Some(Category::Projects)
            })
        );
        assert_eq!(
            match_list("show me my memories"),
            Some(Intent::List { category: None })
        );
    }
}
