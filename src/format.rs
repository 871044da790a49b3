//! Plain-text rendering of match lists and audit reports.

use crate::search::DuplicatePair;
use crate::types::{Corpus, Match};
use std::fmt::Write as _;

/// Message shown when a search succeeded but nothing scored above zero.
pub const NO_MATCHES: &str = "No similar issues found.";

/// Render ranked matches as an aligned table.
///
/// Links come from the corpus; issues without one show their key only.
pub fn render_matches(matches: &[Match], corpus: &Corpus) -> String {
    if matches.is_empty() {
        return NO_MATCHES.to_string();
    }

    let key_width = matches
        .iter()
        .map(|m| display_key(m, corpus).chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::from("Similar issues:\n");
    for m in matches {
        let _ = writeln!(
            output,
            "{:>7}  {:<key_width$}  {:<11}  {}",
            percent(m.similarity),
            display_key(m, corpus),
            m.found_in.as_str(),
            m.summary,
        );
    }
    output
}

/// Render an audit report, one pair per line.
pub fn render_duplicates(pairs: &[DuplicatePair]) -> String {
    if pairs.is_empty() {
        return "No duplicate pairs above the threshold.".to_string();
    }

    let mut output = format!("{} possible duplicate pairs:\n", pairs.len());
    for pair in pairs {
        let _ = writeln!(
            output,
            "{:>7}  {} ~ {}",
            percent(pair.similarity),
            pair.first,
            pair.second
        );
    }
    output
}

fn display_key(m: &Match, corpus: &Corpus) -> String {
    match corpus.get(&m.key).and_then(|issue| issue.link.as_deref()) {
        Some(link) => format!("{} ({})", m.key, link),
        None => m.key.clone(),
    }
}

/// Similarity as a percentage with two decimals, e.g. `87.50%`.
pub fn percent(similarity: f64) -> String {
    format!("{:.2}%", similarity * 100.0)
}
