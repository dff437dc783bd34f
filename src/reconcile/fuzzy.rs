//! Name and type matching between scraped records and price rows

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

fn joined<'a>(parts: impl IntoIterator<Item = &'a String>) -> String {
    parts
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-set similarity of two names on a 0-100 scale
///
/// Both names are lowercased and split into distinct alphanumeric tokens.
/// When one token set contains the other the score is 100; otherwise the
/// best ratio among the sorted intersection and each side's remainder wins.
///
/// ```
/// use furnish_scout::reconcile::token_set_ratio;
///
/// assert_eq!(token_set_ratio("Velvet Sofa", "The Velvet Sofa"), 100.0);
/// assert!(token_set_ratio("Oak Table", "Velvet Sofa") < 50.0);
/// ```
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let common: Vec<&String> = left.intersection(&right).collect();
    let only_left: Vec<&String> = left.difference(&right).collect();
    let only_right: Vec<&String> = right.difference(&left).collect();

    if !common.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100.0;
    }

    let section = joined(common.iter().copied());
    let with_left = joined(common.iter().chain(only_left.iter()).copied());
    let with_right = joined(common.iter().chain(only_right.iter()).copied());

    let mut best = ratio(&with_left, &with_right);
    if !section.is_empty() {
        best = best
            .max(ratio(&section, &with_left))
            .max(ratio(&section, &with_right));
    }
    best
}

/// Lowercased whitespace tokens with one trailing `s` removed
fn type_tokens(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(|word| {
            let word = word.to_lowercase();
            match word.strip_suffix('s') {
                Some(stem) if !stem.is_empty() => stem.to_string(),
                _ => word,
            }
        })
        .collect()
}

/// True when the two type fields share a singular/plural-insensitive token
///
/// Empty fields never match.
pub fn types_match(scraped_type: &str, price_type: &str) -> bool {
    let scraped = type_tokens(scraped_type);
    type_tokens(price_type)
        .iter()
        .any(|token| scraped.contains(token))
}
