//! Memory store semantics: identity overwrite, semantic dedup, forget,
//! clear, list, count.

mod common;

use common::{at_cos, base, candidate, config, orthogonal, store_with, StaticEmbedder};
use nova_memory::memory::{Category, MemoryCandidate};
use nova_memory::similarity::cosine_similarity;

// ============================================================================
// IDENTITY OVERWRITE
// ============================================================================

#[test]
fn test_identity_overwrite_leaves_exactly_one_memory() {
    let embedder = StaticEmbedder::new()
        .with("I live in Berlin", base())
        .with("I moved to Munich", orthogonal(1));
    let store = store_with(embedder, config(0.90, 0.85));

    let first = store
        .save(candidate("u1", "I live in Berlin", Some("profile.location.current")))
        .unwrap();
    assert!(first.newly_written);

    let second = store
        .save(candidate("u1", "I moved to Munich", Some("profile.location.current")))
        .unwrap();
    assert!(second.newly_written);

    let counts = store.count("u1").unwrap();
    assert_eq!(counts.total, 1);

    let groups = store.list("u1", None).unwrap();
    let texts: Vec<_> = groups
        .values()
        .flatten()
        .map(|m| m.memory_text.clone())
        .collect();
    assert_eq!(texts, vec!["I moved to Munich".to_string()]);
}

#[test]
fn test_distinct_fact_keys_coexist() {
    let embedder = StaticEmbedder::new()
        .with("I live in Berlin", base())
        .with("My name is Alice", orthogonal(1));
    let store = store_with(embedder, config(0.90, 0.85));

    store
        .save(candidate("u1", "I live in Berlin", Some("profile.location.current")))
        .unwrap();
    store
        .save(candidate("u1", "My name is Alice", Some("profile.name")))
        .unwrap();

    assert_eq!(store.count("u1").unwrap().total, 2);
}

#[test]
fn test_identity_overwrite_skips_similarity_check() {
    // An identical vector would be a duplicate on the free-form path, but a
    // stable key is an explicit assertion of supersession
    let embedder = StaticEmbedder::new().with("I like pizza", base());
    let store = store_with(embedder, config(0.90, 0.85));

    store.save(candidate("u1", "I like pizza", None)).unwrap();
    let keyed = store
        .save(candidate("u1", "I like pizza", Some("prefs.food.favorite")))
        .unwrap();

    assert!(keyed.newly_written);
    assert_eq!(store.count("u1").unwrap().total, 2);
}

// ============================================================================
// SEMANTIC DEDUP
// ============================================================================

#[test]
fn test_near_duplicate_save_is_suppressed() {
    let embedder = StaticEmbedder::new()
        .with("I like pizza", base())
        .with("I really like pizza!", at_cos(0.95));
    let store = store_with(embedder, config(0.90, 0.85));

    let first = store.save(candidate("u1", "I like pizza", None)).unwrap();
    assert!(first.newly_written);

    let second = store
        .save(candidate("u1", "I really like pizza!", None))
        .unwrap();
    assert!(!second.newly_written);
    assert_eq!(second.memory.id, first.memory.id);
    assert_eq!(second.memory.memory_text, "I like pizza");

    assert_eq!(store.count("u1").unwrap().total, 1);
}

#[test]
fn test_below_threshold_inserts_new_memory() {
    let embedder = StaticEmbedder::new()
        .with("I like pizza", base())
        .with("I work as a nurse", orthogonal(2));
    let store = store_with(embedder, config(0.90, 0.85));

    store.save(candidate("u1", "I like pizza", None)).unwrap();
    let second = store
        .save(candidate("u1", "I work as a nurse", None))
        .unwrap();

    assert!(second.newly_written);
    assert_eq!(store.count("u1").unwrap().total, 2);
}

#[test]
fn test_duplicate_threshold_boundary_is_inclusive() {
    // Pin the threshold to the exact score the index will compute
    let a = base();
    let b = vec![1.0, 1.0, 0.0, 0.0];
    let exact = cosine_similarity(&a, &b);

    let embedder = StaticEmbedder::new()
        .with("first", a)
        .with("second", b);
    let store = store_with(embedder, config(exact, 0.85));

    store.save(candidate("u1", "first", None)).unwrap();
    let outcome = store.save(candidate("u1", "second", None)).unwrap();

    assert!(!outcome.newly_written, "score == threshold must count as a match");
    assert_eq!(store.count("u1").unwrap().total, 1);
}

#[test]
fn test_dedup_is_user_scoped() {
    let embedder = StaticEmbedder::new().with("I like pizza", base());
    let store = store_with(embedder, config(0.90, 0.85));

    store.save(candidate("u1", "I like pizza", None)).unwrap();
    let other_user = store.save(candidate("u2", "I like pizza", None)).unwrap();

    assert!(other_user.newly_written);
    assert_eq!(store.count("u1").unwrap().total, 1);
    assert_eq!(store.count("u2").unwrap().total, 1);
}

// ============================================================================
// FORGET
// ============================================================================

#[test]
fn test_forget_deletes_paraphrase_above_threshold() {
    let embedder = StaticEmbedder::new()
        .with("I enjoy pizza", at_cos(0.87))
        .with("I like pizza", base());
    let store = store_with(embedder, config(0.99, 0.85));

    store.save(candidate("u1", "I enjoy pizza", None)).unwrap();

    let outcome = store.forget("u1", "I like pizza").unwrap();
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.texts, vec!["I enjoy pizza".to_string()]);
    assert_eq!(store.count("u1").unwrap().total, 0);
}

#[test]
fn test_forget_threshold_boundary_is_inclusive() {
    let a = base();
    let b = vec![1.0, 1.0, 0.0, 0.0];
    let exact = cosine_similarity(&a, &b);

    let embedder = StaticEmbedder::new()
        .with("stored fact", b)
        .with("forget target", a);
    let store = store_with(embedder, config(0.99, exact));

    store.save(candidate("u1", "stored fact", None)).unwrap();
    let outcome = store.forget("u1", "forget target").unwrap();
    assert_eq!(outcome.deleted, 1);
}

#[test]
fn test_forget_is_idempotent() {
    let embedder = StaticEmbedder::new()
        .with("I smoke", base())
        .with("forget that I smoke", at_cos(0.9));
    let store = store_with(embedder, config(0.99, 0.85));

    store.save(candidate("u1", "I smoke", None)).unwrap();

    let first = store.forget("u1", "forget that I smoke").unwrap();
    assert_eq!(first.deleted, 1);

    // Nothing left above threshold: a normal zero-match result, not an error
    let second = store.forget("u1", "forget that I smoke").unwrap();
    assert_eq!(second.deleted, 0);
    assert!(second.texts.is_empty());
}

#[test]
fn test_forget_below_threshold_matches_nothing() {
    let embedder = StaticEmbedder::new()
        .with("I play chess", base())
        .with("something unrelated", orthogonal(3));
    let store = store_with(embedder, config(0.99, 0.85));

    store.save(candidate("u1", "I play chess", None)).unwrap();
    let outcome = store.forget("u1", "something unrelated").unwrap();
    assert_eq!(outcome.deleted, 0);
    assert_eq!(store.count("u1").unwrap().total, 1);
}

// ============================================================================
// CLEAR ALL
// ============================================================================

#[test]
fn test_clear_all_totality() {
    let embedder = StaticEmbedder::new()
        .with("a", base())
        .with("b", orthogonal(1))
        .with("c", orthogonal(2));
    let store = store_with(embedder, config(0.90, 0.85));

    store.save(candidate("u1", "a", None)).unwrap();
    store.save(candidate("u1", "b", Some("profile.name"))).unwrap();
    store.save(candidate("u1", "c", None)).unwrap();

    let deleted = store.clear_all("u1").unwrap();
    assert_eq!(deleted, 3);

    assert_eq!(store.count("u1").unwrap().total, 0);
    assert!(store.list("u1", None).unwrap().is_empty());
}

#[test]
fn test_clear_all_on_empty_store() {
    let store = store_with(StaticEmbedder::new(), config(0.90, 0.85));
    assert_eq!(store.clear_all("u1").unwrap(), 0);
}

#[test]
fn test_clear_all_leaves_other_users_alone() {
    let embedder = StaticEmbedder::new().with("a", base());
    let store = store_with(embedder, config(0.90, 0.85));

    store.save(candidate("u1", "a", None)).unwrap();
    store.save(candidate("u2", "a", None)).unwrap();

    store.clear_all("u1").unwrap();
    assert_eq!(store.count("u2").unwrap().total, 1);
}

// ============================================================================
// LIST / COUNT / SEARCH
// ============================================================================

fn multi_category_candidate(user_id: &str, text: &str, categories: Vec<Category>) -> MemoryCandidate {
    MemoryCandidate {
        user_id: user_id.to_string(),
        memory_text: text.to_string(),
        categories,
        fact_key: None,
    }
}

#[test]
fn test_count_consistency_with_list() {
    let embedder = StaticEmbedder::new()
        .with("runs every morning", base())
        .with("works on a compiler", orthogonal(1))
        .with("lives in Berlin", orthogonal(2));
    let store = store_with(embedder, config(0.90, 0.85));

    store
        .save(multi_category_candidate(
            "u1",
            "runs every morning",
            vec![Category::Routines, Category::PersonalDetails],
        ))
        .unwrap();
    store
        .save(multi_category_candidate(
            "u1",
            "works on a compiler",
            vec![Category::Projects],
        ))
        .unwrap();
    store
        .save(multi_category_candidate(
            "u1",
            "lives in Berlin",
            vec![Category::PersonalDetails],
        ))
        .unwrap();

    let counts = store.count("u1").unwrap();
    let groups = store.list("u1", None).unwrap();

    // Total counts distinct memories; the flattened list de-duplicated by id
    // must agree with it
    let mut ids: Vec<_> = groups.values().flatten().map(|m| m.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(counts.total, ids.len());
    assert_eq!(counts.total, 3);

    // Per-category buckets fan out over each memory's category set
    assert_eq!(counts.by_category[&Category::PersonalDetails], 2);
    assert_eq!(counts.by_category[&Category::Routines], 1);
    assert_eq!(counts.by_category[&Category::Projects], 1);
    let bucket_sum: usize = counts.by_category.values().sum();
    assert_eq!(bucket_sum, 4);

    // A two-category memory appears in both of its groups
    assert_eq!(groups[&Category::Routines].len(), 1);
    assert_eq!(groups[&Category::PersonalDetails].len(), 2);
}

#[test]
fn test_list_filters_by_category() {
    let embedder = StaticEmbedder::new()
        .with("works on a compiler", base())
        .with("likes pizza", orthogonal(1));
    let store = store_with(embedder, config(0.90, 0.85));

    store
        .save(multi_category_candidate(
            "u1",
            "works on a compiler",
            vec![Category::Projects],
        ))
        .unwrap();
    store
        .save(multi_category_candidate(
            "u1",
            "likes pizza",
            vec![Category::UserPreferences],
        ))
        .unwrap();

    let groups = store.list("u1", Some(Category::Projects)).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[&Category::Projects].len(), 1);
}

#[test]
fn test_list_orders_groups_most_recent_first() {
    let embedder = StaticEmbedder::new()
        .with("older fact", base())
        .with("newer fact", orthogonal(1));
    let store = store_with(embedder, config(0.90, 0.85));

    store.save(candidate("u1", "older fact", None)).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.save(candidate("u1", "newer fact", None)).unwrap();

    let groups = store.list("u1", None).unwrap();
    let general = &groups[&Category::General];
    assert_eq!(general[0].memory_text, "newer fact");
    assert_eq!(general[1].memory_text, "older fact");
}

#[test]
fn test_search_returns_ranked_results_without_threshold() {
    let embedder = StaticEmbedder::new()
        .with("close match", at_cos(0.8))
        .with("distant match", at_cos(0.1))
        .with("the query", base());
    let store = store_with(embedder, config(0.99, 0.85));

    store.save(candidate("u1", "close match", None)).unwrap();
    store.save(candidate("u1", "distant match", None)).unwrap();

    let hits = store.search("u1", "the query", 10).unwrap();
    assert_eq!(hits.len(), 2, "low scores are still returned");
    assert_eq!(hits[0].memory.memory_text, "close match");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn test_search_on_empty_store_is_empty_not_error() {
    let embedder = StaticEmbedder::new().with("anything", base());
    let store = store_with(embedder, config(0.90, 0.85));
    assert!(store.search("u1", "anything", 5).unwrap().is_empty());
}

#[test]
fn test_search_rejects_zero_top_k() {
    let embedder = StaticEmbedder::new().with("anything", base());
    let store = store_with(embedder, config(0.90, 0.85));

    let err = store.search("u1", "anything", 0).unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
}

// ============================================================================
// FREE-FORM DEFAULTS
// ============================================================================

#[test]
fn test_absent_fact_key_stores_sentinel() {
    let embedder = StaticEmbedder::new().with("I like pizza", base());
    let store = store_with(embedder, config(0.90, 0.85));

    let outcome = store.save(candidate("u1", "I like pizza", None)).unwrap();
    assert!(outcome.memory.fact_key.is_sentinel());
    assert_eq!(outcome.memory.fact_key.as_str(), "other.misc");
}

#[test]
fn test_explicit_sentinel_key_takes_dedup_path() {
    let embedder = StaticEmbedder::new()
        .with("I like pizza", base())
        .with("I enjoy pizza", at_cos(0.95));
    let store = store_with(embedder, config(0.90, 0.85));

    store
        .save(candidate("u1", "I like pizza", Some("other.misc")))
        .unwrap();
    let second = store
        .save(candidate("u1", "I enjoy pizza", Some("other.misc")))
        .unwrap();

    assert!(!second.newly_written);
    assert_eq!(store.count("u1").unwrap().total, 1);
}
