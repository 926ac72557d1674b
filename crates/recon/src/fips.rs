use std::collections::BTreeMap;

use crate::error::ReconError;

/// County FIPS code to county name.
///
/// Several codes may share a county name; one code never maps to two names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountyFipsMap {
    codes: BTreeMap<String, String>,
}

impl CountyFipsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (code, county) in pairs {
            map.insert(code, county)?;
        }
        Ok(map)
    }

    /// Add a mapping. Re-inserting the same pair is a no-op.
    pub fn insert(&mut self, code: impl Into<String>, county: impl Into<String>) -> Result<(), ReconError> {
        let code = code.into();
        let county = county.into();
        match self.codes.get(&code) {
            Some(existing) if *existing != county => Err(ReconError::FipsConflict {
                fips: code,
                existing: existing.clone(),
                conflicting: county,
            }),
            Some(_) => Ok(()),
            None => {
                self.codes.insert(code, county);
                Ok(())
            }
        }
    }

    pub fn county_for(&self, code: &str) -> Option<&str> {
        self.codes.get(code.trim()).map(String::as_str)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.contains_key(code.trim())
    }

    /// All codes belonging to `county`, in code order.
    pub fn codes_for(&self, county: &str) -> Vec<&str> {
        self.codes
            .iter()
            .filter(|(_, name)| name.as_str() == county)
            .map(|(code, _)| code.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_codes_one_county() {
        let map = CountyFipsMap::from_pairs([("003", "Bergen"), ("005", "Bergen"), ("013", "Essex")]).unwrap();
        assert_eq!(map.county_for("003"), Some("Bergen"));
        assert_eq!(map.county_for("005"), Some("Bergen"));
        assert_eq!(map.codes_for("Bergen"), vec!["003", "005"]);
        assert_eq!(map.county_for("999"), None);
    }

    #[test]
    fn conflicting_code_rejected() {
        let err = CountyFipsMap::from_pairs([("013", "Essex"), ("013", "Union")]).unwrap_err();
        assert!(err.to_string().contains("'013'"));
    }

    #[test]
    fn repeated_identical_pair_allowed() {
        let map = CountyFipsMap::from_pairs([("017", "Hudson"), ("017", "Hudson")]).unwrap();
        assert_eq!(map.len(), 1);
    }
}
