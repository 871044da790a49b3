//! Per-field TF-IDF vector space over normalized documents.

use ahash::AHashMap;

/// Term identifier, assigned in first-seen order while building the vocabulary.
type TermId = u32;

/// A document vector: `(term_id, weight)` pairs sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SparseVector {
    entries: Vec<(TermId, f64)>,
    norm: f64,
}

impl SparseVector {
    fn new(mut entries: Vec<(TermId, f64)>) -> Self {
        entries.sort_unstable_by_key(|&(term, _)| term);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        Self { entries, norm }
    }

    /// Euclidean length, zero for an empty document.
    pub(crate) const fn norm(&self) -> f64 {
        self.norm
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.entries.is_empty() || self.norm == 0.0
    }

    /// Dot product via a merge walk over both sorted term lists.
    ///
    /// Summation order depends only on term ids, so repeated calls with the
    /// same inputs produce bit-identical results.
    pub(crate) fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.entries.len() && j < other.entries.len() {
            let (a_term, a_weight) = self.entries[i];
            let (b_term, b_weight) = other.entries[j];
            match a_term.cmp(&b_term) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }
}

/// A vector space built from one field of the corpus.
///
/// Documents are whitespace-separated normalized token strings. Weights are
/// `tf × idf` with the smoothed `idf = ln((N + 1) / (df + 1)) + 1`, so every
/// weight is positive and a term present in every document still counts.
#[derive(Debug, Clone)]
pub(crate) struct FieldSpace {
    vectors: Vec<SparseVector>,
    term_count: usize,
}

impl FieldSpace {
    /// Build the space from already-normalized documents.
    pub(crate) fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut vocabulary: AHashMap<&str, TermId> = AHashMap::new();
        let mut doc_freq: Vec<u32> = vec![];

        // Raw term frequencies per document
        let term_counts: Vec<AHashMap<TermId, u32>> = documents
            .iter()
            .map(|doc| {
                let mut counts: AHashMap<TermId, u32> = AHashMap::new();
                for token in doc.as_ref().split_whitespace() {
                    let next_id = vocabulary.len() as TermId;
                    let term = *vocabulary.entry(token).or_insert_with(|| {
                        doc_freq.push(0);
                        next_id
                    });
                    let count = counts.entry(term).or_insert(0);
                    if *count == 0 {
                        doc_freq[term as usize] += 1;
                    }
                    *count += 1;
                }
                counts
            })
            .collect();

        let total_docs = documents.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((total_docs + 1.0) / (f64::from(df) + 1.0)).ln() + 1.0)
            .collect();

        let vectors = term_counts
            .into_iter()
            .map(|counts| {
                SparseVector::new(
                    counts
                        .into_iter()
                        .map(|(term, tf)| (term, f64::from(tf) * idf[term as usize]))
                        .collect(),
                )
            })
            .collect();

        Self {
            vectors,
            term_count: vocabulary.len(),
        }
    }

    pub(crate) fn vector(&self, doc: usize) -> &SparseVector {
        &self.vectors[doc]
    }

    pub(crate) fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub(crate) fn document_count(&self) -> usize {
        self.vectors.len()
    }

    pub(crate) const fn term_count(&self) -> usize {
        self.term_count
    }
}
