//! Duplicate-detection engine.
//!
//! This module provides TF-IDF based similarity between a candidate ticket and
//! the local issue corpus, including text normalization, per-field vector
//! spaces, result fusion and the corpus-wide duplicate audit.

// Module declarations
pub(crate) mod duplicates;
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use duplicates::{DuplicatePair, ScanField, calculate_similarity};
pub use query::{DEFAULT_TOP_N, FieldScore, MatchOptions, find_similar_issues, rank_matches};
pub use scoring::score_field;
pub use tokenize::{Language, Normalizer, StemmingNormalizer};
