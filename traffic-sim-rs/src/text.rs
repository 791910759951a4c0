// traffic-sim-rs/src/text.rs
// Tokenization and stopword removal for the local embedder

use once_cell::sync::Lazy;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

// Upper bound on tokens taken from a single input
const MAX_TOKENS: usize = 10_000;

/// Common English stopwords
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for",
        "of", "with", "by", "from", "as", "is", "was", "are", "were", "been",
        "be", "have", "has", "had", "do", "does", "did", "will", "would",
        "could", "should", "may", "might", "must", "shall", "can", "need",
        "it", "its", "this", "that", "these", "those", "he", "she", "they",
        "we", "you", "i", "my", "your", "his", "her", "their", "our",
        "what", "which", "who", "whom", "whose", "when", "where", "why", "how",
        "not", "no", "so", "if", "then", "than", "too", "very", "just",
        "about", "into", "through", "during", "before", "after", "above",
        "below", "between", "under", "again", "further", "once", "here",
        "there", "all", "each", "few", "more", "most", "other", "some",
        "such", "only", "own", "same", "also", "both", "any", "nor", "get",
    ]
    .iter()
    .cloned()
    .collect()
});

/// Tokenize text into lowercase words, dropping single characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .take(MAX_TOKENS)
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() > 1)
        .collect()
}

/// Remove stopwords from tokens
pub fn remove_stopwords(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .cloned()
        .collect()
}

/// Tokens that carry meaning for similarity search
pub fn content_terms(text: &str) -> Vec<String> {
    remove_stopwords(&tokenize(text))
}
