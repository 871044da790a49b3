//! Corpus-wide duplicate audit over one text field.
//!
//! This is an all-pairs scan, quadratic in corpus size. It is meant for
//! periodic reports and is never called from the interactive matcher.

use super::index::FieldSpace;
use super::scoring::cosine_similarity;
use super::tokenize::Normalizer;
use crate::types::{Corpus, Issue, Threshold};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which issue text the audit compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanField {
    Title,
    Description,
    /// Title and description together
    #[default]
    FullText,
}

impl ScanField {
    fn text(self, issue: &Issue) -> String {
        match self {
            Self::Title => issue.summary.clone(),
            Self::Description => issue.description.clone(),
            Self::FullText => issue.full_text(),
        }
    }
}

/// Two issues whose texts are more similar than the audit threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatePair {
    /// Key of the issue that comes first in corpus order
    pub first: String,
    pub second: String,
    pub similarity: f64,
}

/// Report every unordered pair of issues whose similarity exceeds `threshold`.
///
/// Pairs are sorted by similarity, descending; equal scores keep corpus order.
pub fn calculate_similarity(
    normalizer: &dyn Normalizer,
    corpus: &Corpus,
    field: ScanField,
    threshold: Threshold,
) -> Vec<DuplicatePair> {
    if corpus.len() < 2 {
        return vec![];
    }

    let start = std::time::Instant::now();
    let documents: Vec<String> = corpus
        .issues()
        .iter()
        .map(|issue| normalizer.normalize(&field.text(issue)))
        .collect();
    let space = FieldSpace::build(&documents);
    let issues = corpus.issues();
    let cutoff = threshold.value();

    // Rows run in parallel; collecting an indexed iterator keeps row order
    let rows: Vec<Vec<DuplicatePair>> = (0..space.document_count())
        .into_par_iter()
        .map(|i| {
            let row = space.vector(i);
            ((i + 1)..space.document_count())
                .filter_map(|j| {
                    let similarity = cosine_similarity(row, space.vector(j));
                    (similarity > cutoff).then(|| DuplicatePair {
                        first: issues[i].key.clone(),
                        second: issues[j].key.clone(),
                        similarity,
                    })
                })
                .collect()
        })
        .collect();

    let mut pairs: Vec<DuplicatePair> = rows.into_iter().flatten().collect();
    pairs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    tracing::info!(
        "Duplicate audit over {} issues ({} terms) found {} pairs above {} in {:?}",
        corpus.len(),
        space.term_count(),
        pairs.len(),
        cutoff,
        start.elapsed()
    );

    pairs
}
