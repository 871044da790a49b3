pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod finder;
pub mod format;
pub mod search;
pub mod snapshot;
pub mod source;
pub mod tracing;
pub mod tracker;
pub mod types;

pub use cache::{CacheSettings, Freshness, IssueCache};
pub use error::{FetchError, InvalidInput};
pub use finder::{DuplicateFinder, Lookup};
pub use search::{
    DuplicatePair, Language, MatchOptions, Normalizer, ScanField, StemmingNormalizer,
    calculate_similarity, find_similar_issues,
};
pub use source::IssueSource;
pub use types::{Corpus, FoundIn, Issue, Match, Query, Threshold};
