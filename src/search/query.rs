//! Two-field query matching: scoring, fusion and ranking.

use super::scoring::score_field;
use super::tokenize::Normalizer;
use crate::types::{Corpus, FoundIn, Match, Query};
use ahash::AHashSet;

/// Number of matches returned when the caller does not say otherwise.
pub const DEFAULT_TOP_N: usize = 5;

/// Tuning for a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Maximum number of matches to return
    pub top_n: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// One per-field score for one issue, before fusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldScore {
    /// Position of the issue in the corpus
    pub index: usize,
    pub similarity: f64,
    pub found_in: FoundIn,
}

/// Find the issues most similar to `query`.
///
/// Titles are scored against the query title and descriptions against the
/// query description, each in its own vector space. The two score lists are
/// then fused with [`rank_matches`].
pub fn find_similar_issues(
    normalizer: &dyn Normalizer,
    query: &Query,
    corpus: &Corpus,
    options: MatchOptions,
) -> Vec<Match> {
    if corpus.is_empty() {
        tracing::debug!("Corpus is empty, no matches to rank");
        return vec![];
    }

    let start = std::time::Instant::now();

    let titles: Vec<String> = corpus
        .issues()
        .iter()
        .map(|issue| normalizer.normalize(&issue.summary))
        .collect();
    let descriptions: Vec<String> = corpus
        .issues()
        .iter()
        .map(|issue| normalizer.normalize(&issue.description))
        .collect();

    let title_scores = tag_scores(
        score_field(&normalizer.normalize(&query.title), &titles),
        FoundIn::Title,
    );
    let description_scores = tag_scores(
        score_field(&normalizer.normalize(&query.description), &descriptions),
        FoundIn::Description,
    );

    let matches = rank_matches(corpus, title_scores, description_scores, options.top_n);

    tracing::debug!(
        "Ranked {} matches over {} issues in {:?}",
        matches.len(),
        corpus.len(),
        start.elapsed()
    );

    matches
}

fn tag_scores(scores: Vec<f64>, found_in: FoundIn) -> Vec<FieldScore> {
    scores
        .into_iter()
        .enumerate()
        .map(|(index, similarity)| FieldScore {
            index,
            similarity,
            found_in,
        })
        .collect()
}

/// Fuse title and description scores into at most `top_n` matches.
///
/// Each issue keeps a single slot: its best-scoring field wins and the other
/// field's score is discarded. Non-positive scores are dropped. Ordering is by
/// similarity, descending; ties keep title scores before description scores
/// and corpus order within a field.
pub fn rank_matches(
    corpus: &Corpus,
    title_scores: Vec<FieldScore>,
    description_scores: Vec<FieldScore>,
    top_n: usize,
) -> Vec<Match> {
    let mut candidates = title_scores;
    candidates.extend(description_scores);

    // Stable sort: ties stay in concatenation order
    candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    let mut seen = AHashSet::with_capacity(corpus.len());
    let mut best: Vec<FieldScore> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.index))
        .filter(|candidate| candidate.similarity > 0.0)
        .collect();

    best.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    best.into_iter()
        .filter_map(|candidate| {
            corpus.issues().get(candidate.index).map(|issue| Match {
                key: issue.key.clone(),
                summary: issue.summary.clone(),
                similarity: candidate.similarity.min(1.0),
                found_in: candidate.found_in,
            })
        })
        .take(top_n)
        .collect()
}
