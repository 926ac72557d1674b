//! Key normalization shared by the reference table, override table and engine.

/// Normalize a name or county for key comparison.
///
/// Trims, collapses internal whitespace runs to a single space and lowercases.
/// Display values are never replaced by this form.
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized (name, county) composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey {
    pub name: String,
    pub county: String,
}

impl NameKey {
    pub fn new(name: &str, county: &str) -> Self {
        Self {
            name: normalize(name),
            county: normalize(county),
        }
    }
}
