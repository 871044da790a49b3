//! Cosine similarity and per-field query scoring.

use super::index::{FieldSpace, SparseVector};

/// Cosine of the angle between two document vectors.
///
/// Defined as 0 when either vector is all-zero. Clamped to `[0, 1]` to absorb
/// rounding on identical documents.
pub(crate) fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }

    (a.dot(b) / (a.norm() * b.norm())).clamp(0.0, 1.0)
}

/// Score one normalized query against every normalized corpus entry of a single field.
///
/// The query joins the corpus as one extra document before weighting, so its
/// vocabulary shapes the space exactly like a corpus entry would. Each call
/// builds its own space; fields never share vocabulary.
///
/// Returns one score per corpus entry, in corpus order. An empty corpus
/// returns an empty list without building anything.
pub fn score_field<S: AsRef<str>>(query: &str, corpus: &[S]) -> Vec<f64> {
    if corpus.is_empty() {
        return vec![];
    }

    let mut documents: Vec<&str> = corpus.iter().map(AsRef::as_ref).collect();
    documents.push(query);

    let space = FieldSpace::build(&documents);
    let query_vector = space.vector(corpus.len());

    if query_vector.is_zero() {
        return vec![0.0; corpus.len()];
    }

    space.vectors()[..corpus.len()]
        .iter()
        .map(|entry| cosine_similarity(query_vector, entry))
        .collect()
}
