//! Documented constants for the memory engine
//!
//! All tunable parameters in one place with justification for their values.
//! Centralizing constants prevents magic numbers and makes tuning easier.

// =============================================================================
// SIMILARITY THRESHOLDS
// Scores are cosine similarity in [0, 1]; both thresholds are inclusive:
// a score exactly equal to the threshold counts as a match.
// =============================================================================

/// Default similarity threshold for duplicate suppression
///
/// A free-form save whose embedding scores at or above this against any
/// existing memory of the same user is treated as a restatement and not
/// inserted.
///
/// Justification:
/// - 0.90 catches rewordings ("I like pizza" / "I enjoy pizza") while
///   leaving room for genuinely new facts on the same topic
/// - Lower values start suppressing distinct facts that merely share a topic
pub const DEFAULT_DUPLICATE_THRESHOLD: f32 = 0.90;

/// Default similarity threshold for semantic forget
///
/// A forget request deletes every memory of the user scoring at or above
/// this against the target text.
///
/// Justification:
/// - Deliberately looser than the duplicate threshold: the user is asking
///   for removal, so matching their paraphrase matters more than precision
/// - 0.85 still keeps unrelated memories well out of reach
pub const DEFAULT_FORGET_THRESHOLD: f32 = 0.85;

// =============================================================================
// FACT KEYS
// =============================================================================

/// Sentinel fact key marking a free-form memory
///
/// Memories carrying this key have no identity-based uniqueness; duplicate
/// suppression for them is purely semantic.
pub const SENTINEL_FACT_KEY: &str = "other.misc";

// =============================================================================
// SEARCH AND SCAN LIMITS
// =============================================================================

/// Candidates examined during duplicate detection
///
/// One hit is enough to declare a duplicate, but scanning a few candidates
/// makes the check robust when several borderline near-duplicates exist.
pub const DEDUP_SCAN_TOP_K: usize = 5;

/// Upper bound on memories examined by a single forget request
///
/// Forget is unbounded within the user's scope in spirit; the cap only
/// protects the scan against pathological memory counts.
pub const FORGET_SCAN_CAP: usize = 256;

/// Page size used when enumerating a user's memories (list, count, clear)
pub const LIST_PAGE_SIZE: usize = 512;

/// Default number of grounding memories fetched per chat turn
///
/// The original backend grounds replies on the top 3 matches; more adds
/// prompt bulk without measurably better answers.
pub const DEFAULT_GROUNDING_TOP_K: usize = 3;

/// Results returned by a user-issued memory search command
pub const SEARCH_COMMAND_TOP_K: usize = 5;

// =============================================================================
// EMBEDDINGS
// =============================================================================

/// Default embedding dimension
///
/// Matches MiniLM-class sentence encoders; the vector index is created with
/// this dimension and every provider must agree with it.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
