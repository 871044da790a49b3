//! Core record types shared by the engine, the cache and the presentation layer.

use crate::error::InvalidInput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single tracker issue as fetched from the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identity assigned by the tracker (e.g. `SUPPORT-42`)
    pub key: String,
    /// Issue title
    pub summary: String,
    /// Issue body, empty when the tracker has none
    #[serde(default)]
    pub description: String,
    /// Browsable URL, derivable from `key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Issue {
    pub fn new(
        key: impl Into<String>,
        summary: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            description: description.into(),
            link: None,
        }
    }

    /// Fill in `link` from a base URL unless the source already supplied one.
    pub fn with_link_base(mut self, base: &str) -> Self {
        if self.link.is_none() && !base.is_empty() {
            self.link = Some(format!("{}/{}", base.trim_end_matches('/'), self.key));
        }
        self
    }

    /// Title and body joined, used by the corpus-wide duplicate audit.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.summary, self.description)
    }
}

/// Every issue currently known locally. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    issues: Vec<Issue>,
}

impl Corpus {
    /// Build a corpus, keeping the first occurrence of any repeated key.
    pub fn new(issues: Vec<Issue>) -> Self {
        let mut seen = ahash::AHashSet::with_capacity(issues.len());
        let total = issues.len();
        let issues: Vec<Issue> = issues
            .into_iter()
            .filter(|issue| seen.insert(issue.key.clone()))
            .collect();

        if issues.len() != total {
            tracing::warn!(
                "Dropped {} issues with duplicate keys while building corpus",
                total - issues.len()
            );
        }

        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.key == key)
    }
}

impl FromIterator<Issue> for Corpus {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The text field that produced an issue's reported score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoundIn {
    Title,
    Description,
}

impl FoundIn {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for FoundIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked candidate duplicate for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub key: String,
    pub summary: String,
    /// Cosine similarity in `(0, 1]`
    pub similarity: f64,
    pub found_in: FoundIn,
}

/// A candidate ticket to check against the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub title: String,
    pub description: String,
}

impl Query {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Parse a free-form message: the first line is the title, the rest is the description.
    pub fn parse(text: &str) -> Result<Self, InvalidInput> {
        if text.trim().is_empty() {
            return Err(InvalidInput::EmptyQuery);
        }

        let (title, description) = match text.split_once('\n') {
            Some((title, rest)) => (title.trim(), rest.trim()),
            None => (text.trim(), ""),
        };

        Ok(Self::new(title, description))
    }
}

/// Similarity cut-off for the duplicate audit, validated to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: Self = Self(0.8);

    pub fn new(value: f64) -> Result<Self, InvalidInput> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidInput::Threshold(value))
        }
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[test]
    fn corpus_keeps_first_of_duplicate_keys() {
        let corpus = Corpus::new(vec![
            Issue::new("T-1", "first", ""),
            Issue::new("T-2", "second", ""),
            Issue::new("T-1", "shadowed", ""),
        ]);
        check!(corpus.len() == 2);
        check!(corpus.get("T-1").map(|i| i.summary.as_str()) == Some("first"));
    }

    #[rstest]
    #[case("Login fails", "Login fails", "")]
    #[case("Login fails\nUser cannot authenticate", "Login fails", "User cannot authenticate")]
    #[case("  Title  \n line one\nline two \n", "Title", "line one\nline two")]
    fn test_query_parse(#[case] text: &str, #[case] title: &str, #[case] description: &str) {
        let_assert!(Ok(query) = Query::parse(text));
        check!(query.title == title);
        check!(query.description == description);
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t ")]
    fn test_query_parse_rejects_blank(#[case] text: &str) {
        let_assert!(Err(InvalidInput::EmptyQuery) = Query::parse(text));
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.8, true)]
    #[case(1.0, true)]
    #[case(-0.1, false)]
    #[case(1.5, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn test_threshold_bounds(#[case] value: f64, #[case] valid: bool) {
        check!(Threshold::new(value).is_ok() == valid);
    }

    #[rstest]
    #[case("https://tracker.example.com", "https://tracker.example.com/T-7")]
    #[case("https://tracker.example.com/", "https://tracker.example.com/T-7")]
    fn test_link_derived_from_key(#[case] base: &str, #[case] expected: &str) {
        let issue = Issue::new("T-7", "title", "").with_link_base(base);
        check!(issue.link.as_deref() == Some(expected));
    }

    #[test]
    fn test_existing_link_is_kept() {
        let mut issue = Issue::new("T-7", "title", "");
        issue.link = Some("https://elsewhere/T-7".into());
        let issue = issue.with_link_base("https://tracker.example.com");
        check!(issue.link.as_deref() == Some("https://elsewhere/T-7"));
    }

    #[test]
    fn test_found_in_serializes_lowercase() {
        check!(serde_json::to_string(&FoundIn::Description).unwrap() == "\"description\"");
        check!(FoundIn::Title.to_string() == "title");
    }
}
