use std::collections::HashSet;

use super::key::is_word_char;

/// Tokens of this many characters or fewer carry no signal ("de", "10", "in").
const MIN_TOKEN_CHARS: usize = 3;

/// Jaccard similarity between the token sets of two free-text fields.
///
/// Always in `[0, 1]` and symmetric. An empty side, or two texts with no
/// usable tokens, score `0`.
pub fn similarity(a: Option<&str>, b: Option<&str>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let left = token_set(a);
    let right = token_set(b);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}

pub(crate) fn token_set(text: &str) -> HashSet<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|ch| is_word_char(*ch) || ch.is_whitespace())
        .map(fold_accent)
        .collect();
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Folds the accented Latin letters that show up in Spanish catalogs onto
/// their base letter. Input is already lowercase.
pub(crate) fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
