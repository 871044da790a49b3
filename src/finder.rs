//! Query front end tying the cache to the matching engine.

use crate::cache::IssueCache;
use crate::error::FetchError;
use crate::search::{
    DuplicatePair, MatchOptions, Normalizer, ScanField, calculate_similarity, find_similar_issues,
};
use crate::source::IssueSource;
use crate::types::{Corpus, Match, Query, Threshold};
use std::sync::Arc;
use tokio::task::JoinError;

/// Result of one lookup: the ranked matches plus the corpus they came from.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub matches: Vec<Match>,
    pub corpus: Arc<Corpus>,
}

/// Finds likely duplicates of new tickets among the cached corpus.
pub struct DuplicateFinder<S, N> {
    cache: IssueCache<S>,
    normalizer: N,
    options: MatchOptions,
}

impl<S: IssueSource, N: Normalizer> DuplicateFinder<S, N> {
    pub const fn new(cache: IssueCache<S>, normalizer: N, options: MatchOptions) -> Self {
        Self {
            cache,
            normalizer,
            options,
        }
    }

    /// Rank existing issues against `query`.
    ///
    /// An empty `matches` list means the search ran and found nothing; an
    /// error means the corpus could not be obtained.
    pub async fn find(&self, query: &Query) -> Result<Lookup, FetchError> {
        let corpus = self.cache.get_corpus().await?;
        let matches = find_similar_issues(&self.normalizer, query, &corpus, self.options);
        Ok(Lookup { matches, corpus })
    }

    /// Audit the cached corpus for pairs of issues that duplicate each other.
    ///
    /// The pairwise scan runs on the blocking pool so it never stalls the
    /// runtime's request handling.
    pub async fn audit(
        &self,
        field: ScanField,
        threshold: Threshold,
    ) -> Result<Vec<DuplicatePair>, FetchError>
    where
        N: Clone + 'static,
    {
        let corpus = self.cache.get_corpus().await?;
        let normalizer = self.normalizer.clone();

        let scan = tokio::task::spawn_blocking(move || {
            calculate_similarity(&normalizer, &corpus, field, threshold)
        });
        joined(scan.await)
    }

    pub const fn cache(&self) -> &IssueCache<S> {
        &self.cache
    }

    pub const fn options(&self) -> MatchOptions {
        self.options
    }
}

/// Unwrap a background task's result. Panics propagate to the caller;
/// cancellation becomes an error.
fn joined<T>(result: Result<T, JoinError>) -> Result<T, FetchError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            tracing::warn!("Background task did not finish: {}", e);
            Err(FetchError::Cancelled)
        }
    }
}
