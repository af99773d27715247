use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Separator between the normalized alias and description. Normalization
/// never emits it, so every key splits back into exactly two halves.
pub const KEY_SEPARATOR: char = '|';

/// Primary key of the product store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductKey(String);

impl ProductKey {
    /// Wraps a key that was produced elsewhere (a snapshot or an import
    /// file) without re-deriving it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the canonical key for an (alias, description) pair. Inputs that
/// differ only in case, punctuation or spacing share a key; two empty
/// inputs land in the `"|"` bucket.
pub fn derive_key(alias: Option<&str>, description: Option<&str>) -> ProductKey {
    let alias = normalize_field(alias.unwrap_or_default());
    let description = normalize_field(description.unwrap_or_default());
    ProductKey(format!("{alias}{KEY_SEPARATOR}{description}"))
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn normalize_field(raw: &str) -> String {
    let spaced: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| if is_word_char(ch) { ch } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
