use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// English stop set applied by the standard analyzer.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Tokenizer shared by index building and vectorization.
///
/// Lowercases the input, splits on every non-alphanumeric character and
/// drops stop words. Both sides of the pipeline must use the same instance
/// configuration, otherwise term lookups silently miss.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<Box<str>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Tokenizer {
    /// Tokenizer with the English stop set
    pub fn english() -> Self {
        Self::with_stop_words(ENGLISH_STOP_WORDS)
    }

    /// Tokenizer with a custom stop set (matched case-insensitively)
    pub fn with_stop_words<T>(words: &[T]) -> Self
    where
        T: AsRef<str>,
    {
        Self {
            stop_words: words
                .iter()
                .map(|w| w.as_ref().to_lowercase().into_boxed_str())
                .collect(),
        }
    }

    #[inline]
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Split text into normalized tokens, in order of appearance
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|raw| !raw.is_empty())
            .map(str::to_lowercase)
            .filter(|tok| !self.is_stop_word(tok))
            .collect()
    }

    /// Tokenize and count in one pass
    pub fn term_frequency(&self, text: &str) -> TermFrequency {
        let mut freq = TermFrequency::new();
        freq.add_terms(&self.tokenize(text));
        freq
    }
}

/// TermFrequency
/// Per-document term occurrence counts, in first-occurrence order.
///
/// # Examples
/// ```
/// use job_match::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_term("python");
/// freq.add_term("rust");
/// freq.add_term("python");
/// assert_eq!(freq.term_count("python"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

impl TermFrequency {
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Add one occurrence of a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    /// Add several terms
    ///
    /// # Arguments
    /// * `terms` - slice of terms
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    /// Occurrence count of a term (0 when absent)
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        *self.term_count.get(term).unwrap_or(&0)
    }

    /// Total number of term occurrences, including repeated ones
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Distinct terms as references, in first-occurrence order
    #[inline]
    pub fn term_set_ref_str(&self) -> Vec<&str> {
        self.term_count.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate `(term, count)` pairs in first-occurrence order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }

    /// Reset all counts
    #[inline]
    pub fn clear(&mut self) {
        self.term_count.clear();
        self.total_term_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_strips_punctuation_and_stop_words() {
        let tok = Tokenizer::english();
        let terms = tok.tokenize("The Backend-Engineer, with PYTHON; and Rust!");
        assert_eq!(terms, vec!["backend", "engineer", "python", "rust"]);
    }

    #[test]
    fn tokenize_empty_and_punctuation_only() {
        let tok = Tokenizer::english();
        assert!(tok.tokenize("").is_empty());
        assert!(tok.tokenize("  ,;.!  -- ").is_empty());
        assert!(tok.tokenize("the and of").is_empty());
    }

    #[test]
    fn term_frequency_counts_repeats_and_keeps_order() {
        let tok = Tokenizer::english();
        let freq = tok.term_frequency("sql python sql go");
        assert_eq!(freq.term_sum(), 4);
        assert_eq!(freq.term_num(), 3);
        assert_eq!(freq.term_count("sql"), 2);
        assert_eq!(freq.term_count("java"), 0);
        assert_eq!(freq.term_set_ref_str(), vec!["sql", "python", "go"]);
    }

    #[test]
    fn custom_stop_words_are_case_insensitive() {
        let tok = Tokenizer::with_stop_words(&["Senior"]);
        assert_eq!(tok.tokenize("senior the engineer"), vec!["the", "engineer"]);
    }

    #[test]
    fn clear_resets_counts() {
        let mut freq = TermFrequency::new();
        freq.add_terms(&["a", "b"]);
        freq.clear();
        assert_eq!(freq.term_sum(), 0);
        assert!(!freq.contains_term("a"));
    }
}
