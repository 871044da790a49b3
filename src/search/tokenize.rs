//! Text normalization: tokenization, stop-word filtering and stemming.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Minimum token length (in characters) kept after splitting.
const MIN_TOKEN_LENGTH: usize = 2;

/// Common English stop words to filter out before scoring.
pub(crate) const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Common Russian stop words to filter out before scoring.
pub(crate) const RUSSIAN_STOP_WORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "только", "ее",
    "мне", "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "при", "это", "для",
];

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?|ftp)://\S+").expect("URL pattern is valid"));

/// Maps raw text to a space-separated string of normalized tokens.
///
/// Implementations must be pure, deterministic and total: the same input
/// always yields the same output and empty input yields an empty string.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Language used for stop words and stemming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    const fn algorithm(self) -> Algorithm {
        match self {
            Self::English => Algorithm::English,
            Self::Russian => Algorithm::Russian,
        }
    }

    const fn stop_words(self) -> &'static [&'static str] {
        match self {
            Self::English => ENGLISH_STOP_WORDS,
            Self::Russian => RUSSIAN_STOP_WORDS,
        }
    }
}

/// Default normalizer backed by Snowball stemmers.
pub struct StemmingNormalizer {
    language: Language,
    stemmer: Stemmer,
}

impl StemmingNormalizer {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            stemmer: Stemmer::create(language.algorithm()),
        }
    }

    pub const fn language(&self) -> Language {
        self.language
    }
}

impl Default for StemmingNormalizer {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl Clone for StemmingNormalizer {
    fn clone(&self) -> Self {
        Self::new(self.language)
    }
}

impl std::fmt::Debug for StemmingNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemmingNormalizer")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl Normalizer for StemmingNormalizer {
    fn normalize(&self, text: &str) -> String {
        tokenize_and_stem(text, &self.stemmer, self.language.stop_words()).join(" ")
    }
}

/// Character class used to find sub-word boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
}

impl CharClass {
    fn of(c: char) -> Option<Self> {
        if c.is_numeric() {
            Some(Self::Digit)
        } else if c.is_uppercase() {
            Some(Self::Upper)
        } else if c.is_alphabetic() {
            Some(Self::Lower)
        } else {
            None
        }
    }
}

/// Tokenizes text into normalized terms with stemming and case-aware splitting.
///
/// Words are runs of alphanumeric characters joined by `-` or `_`. Each word
/// is split into sub-words on:
/// - **snake_case / hyphen-case**: "parse_json" → ["parse", "json"]
/// - **camelCase**: "HttpServer" → ["http", "server"], plus the compound "httpserver"
/// - **letter/digit transitions**: "error500" → ["error", "500"]
///
/// Sub-words shorter than two characters and stop words are dropped.
pub(crate) fn tokenize_and_stem(text: &str, stemmer: &Stemmer, stop_words: &[&str]) -> Vec<String> {
    let text = URL_PATTERN.replace_all(text, " ");
    let mut tokens = vec![];

    for word in text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_')) {
        if word.is_empty() {
            continue;
        }

        let mut subwords: Vec<&str> = vec![];
        let mut has_separator = false;

        for part in word.split(['-', '_']) {
            if part.is_empty() {
                has_separator = true;
                continue;
            }
            if part.len() != word.len() {
                has_separator = true;
            }
            split_case_boundaries(part, &mut subwords);
        }

        for subword in &subwords {
            push_token(subword, &mut tokens, stemmer, stop_words);
        }

        // Keep the compound for camelCase words so "HttpServer" also matches "httpserver"
        let all_alphabetic = word.chars().all(char::is_alphabetic);
        if subwords.len() > 1 && !has_separator && all_alphabetic {
            push_token(word, &mut tokens, stemmer, stop_words);
        }
    }

    tokens
}

/// Split one separator-free part on lower→upper and letter↔digit transitions.
///
/// An uppercase run followed by a lowercase letter keeps its last capital with
/// the lowercase tail ("HTTPServer" → ["HTTP", "Server"]).
fn split_case_boundaries<'a>(part: &'a str, out: &mut Vec<&'a str>) {
    let chars: Vec<(usize, char)> = part.char_indices().collect();
    let mut start = 0;

    for window in 1..chars.len() {
        let (idx, c) = chars[window];
        let prev = CharClass::of(chars[window - 1].1);
        let curr = CharClass::of(c);
        let next = chars.get(window + 1).and_then(|&(_, n)| CharClass::of(n));

        let boundary = match (prev, curr) {
            (Some(CharClass::Lower), Some(CharClass::Upper)) => true,
            (Some(CharClass::Digit), Some(CharClass::Lower | CharClass::Upper)) => true,
            (Some(CharClass::Lower | CharClass::Upper), Some(CharClass::Digit)) => true,
            (Some(CharClass::Upper), Some(CharClass::Upper)) => next == Some(CharClass::Lower),
            _ => false,
        };

        if boundary {
            out.push(&part[start..idx]);
            start = idx;
        }
    }

    out.push(&part[start..]);
}

/// Lowercase, filter and stem a single token.
fn push_token(token: &str, tokens: &mut Vec<String>, stemmer: &Stemmer, stop_words: &[&str]) {
    if token.chars().count() < MIN_TOKEN_LENGTH {
        return;
    }

    let lowercase = token.to_lowercase();
    if stop_words.contains(&lowercase.as_str()) {
        return;
    }

    let stemmed = stemmer.stem(&lowercase);
    tokens.push(stemmed.into_owned());
}
