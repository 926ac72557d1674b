//! Disambiguation overrides for municipality names repeated across counties.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::normalize::NameKey;

/// One `[[overrides]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverrideEntry {
    pub raw_name: String,
    pub county: String,
    pub canonical: String,
}

/// `(raw_name, county)` -> canonical reference name.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<NameKey, String>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config entries.
    ///
    /// Rejects two entries for one `(raw_name, county)` and two entries that
    /// would send different raw names to the same canonical row.
    pub fn from_entries(entries: &[OverrideEntry]) -> Result<Self, ReconError> {
        let mut table = Self::new();
        let mut targets: HashMap<NameKey, &str> = HashMap::new();

        for entry in entries {
            let key = NameKey::new(&entry.raw_name, &entry.county);
            if table.entries.contains_key(&key) {
                return Err(ReconError::ConfigValidation(format!(
                    "override for ('{}', '{}') defined twice",
                    entry.raw_name, entry.county
                )));
            }
            let target = NameKey::new(&entry.canonical, &entry.county);
            if let Some(previous) = targets.insert(target, entry.raw_name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "overrides for '{previous}' and '{}' both resolve to '{}' in {}",
                    entry.raw_name, entry.canonical, entry.county
                )));
            }
            table.entries.insert(key, entry.canonical.clone());
        }

        Ok(table)
    }

    /// Name to look up for a boundary; the raw name when no override applies.
    pub fn resolve<'a>(&'a self, raw_name: &'a str, county: Option<&str>) -> &'a str {
        county
            .and_then(|c| self.entries.get(&NameKey::new(raw_name, c)))
            .map(String::as_str)
            .unwrap_or(raw_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
