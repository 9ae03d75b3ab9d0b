//! Document text cleaning.

use std::collections::HashSet;

/// Lower-cased stopwords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    /// One word per line; blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        Self(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_lowercase)
                .collect(),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalize a document into space-separated tokens.
///
/// Tokens are lower-cased and stripped of ASCII punctuation. Only purely
/// alphabetic tokens longer than one character that are not stopwords survive.
pub fn clean_doc(text: &str, stopwords: &StopWords) -> String {
    text.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| !c.is_ascii_punctuation())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| token.chars().count() > 1)
        .filter(|token| token.chars().all(char::is_alphabetic))
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}
