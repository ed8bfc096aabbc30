//! Lexical overlap scoring

use std::collections::HashMap;

/// Multiset word overlap between a response and its reference.
///
/// Both texts are lowercased and split on whitespace. The per-word minimum
/// count is summed and divided by the reference token count (floored at 1),
/// so the ratio is always in `[0, 1]`. No stemming, stop words or
/// punctuation handling: `"paris."` and `"paris"` are different words.
pub fn overlap(response: &str, reference: &str) -> f64 {
    let response_counts = token_counts(response);
    let reference_counts = token_counts(reference);

    let reference_len: usize = reference_counts.values().sum();
    let common: usize = reference_counts
        .iter()
        .map(|(word, &count)| count.min(response_counts.get(word).copied().unwrap_or(0)))
        .sum();

    common as f64 / reference_len.max(1) as f64
}

fn token_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in text.to_lowercase().split_whitespace() {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    counts
}
