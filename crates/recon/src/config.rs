use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::ReconError;
use crate::fips::CountyFipsMap;
use crate::model::SourceLayer;
use crate::normalize::normalize;
use crate::overrides::{OverrideEntry, OverrideTable};
use crate::reference::DuplicatePolicy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    pub target_counties: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    pub reference: ReferenceConfig,
    pub county_fips: BTreeMap<String, String>,
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub scenarios: BTreeMap<String, ScenarioConfig>,
    #[serde(default)]
    pub comparisons: Vec<CityComparison>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub boundary_chain: Vec<ProviderRef>,
}

fn default_output_dir() -> String {
    "visualizations".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    pub file: String,
}

// ---------------------------------------------------------------------------
// Scenarios + comparisons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub name: String,
    pub counties: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// A city the consolidated region is ranked against.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CityComparison {
    pub city: String,
    pub population: u64,
}

// ---------------------------------------------------------------------------
// Boundary sources
// ---------------------------------------------------------------------------

/// One boundary data provider (TIGER/Line extract, state extract, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    /// Root directory, relative to the config file.
    pub dir: String,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_county_column")]
    pub county_column: String,
    #[serde(default)]
    pub state_column: Option<String>,
    #[serde(default)]
    pub state_fips: Option<String>,
    #[serde(default)]
    pub layers: SourceLayers,
}

fn default_name_column() -> String {
    "NAME".into()
}

fn default_county_column() -> String {
    "COUNTYFP".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceLayers {
    #[serde(default)]
    pub municipality: Option<LayerConfig>,
    #[serde(default)]
    pub county_subdivision: Option<LayerConfig>,
    #[serde(default)]
    pub county: Option<LayerConfig>,
}

impl SourceLayers {
    pub fn get(&self, layer: SourceLayer) -> Option<&LayerConfig> {
        match layer {
            SourceLayer::Municipality => self.municipality.as_ref(),
            SourceLayer::CountySubdivision => self.county_subdivision.as_ref(),
            SourceLayer::County => self.county.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Extracted directory, relative to the source `dir`.
    pub path: String,
    /// Archive to download when the directory is missing.
    #[serde(default)]
    pub url: Option<String>,
}

/// Entry of the ordered boundary fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderRef {
    pub source: String,
    pub layer: SourceLayer,
}

impl std::fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.layer)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.target_counties.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one target county is required".into(),
            ));
        }

        let mut targets = BTreeSet::new();
        for county in &self.target_counties {
            if !targets.insert(normalize(county)) {
                return Err(ReconError::ConfigValidation(format!(
                    "target county '{county}' listed twice"
                )));
            }
        }

        for (code, county) in &self.county_fips {
            if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ReconError::ConfigValidation(format!(
                    "county FIPS code '{code}' must be three digits"
                )));
            }
            if !targets.contains(&normalize(county)) {
                return Err(ReconError::ConfigValidation(format!(
                    "FIPS code '{code}' maps to '{county}', which is not a target county"
                )));
            }
        }

        // Duplicate / colliding overrides.
        OverrideTable::from_entries(&self.overrides)?;

        for (id, scenario) in &self.scenarios {
            if scenario.counties.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "scenario '{id}' has no counties"
                )));
            }
            if let Some(c) = scenario.counties.iter().find(|c| !targets.contains(&normalize(c))) {
                return Err(ReconError::ConfigValidation(format!(
                    "scenario '{id}': '{c}' is not a target county"
                )));
            }
        }

        if let Some(c) = self.colors.keys().find(|c| !targets.contains(&normalize(c))) {
            return Err(ReconError::ConfigValidation(format!(
                "color defined for '{c}', which is not a target county"
            )));
        }

        let mut names = BTreeSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{}' defined twice",
                    source.name
                )));
            }
            if source.state_column.is_some() != source.state_fips.is_some() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{}': state_column and state_fips must be set together",
                    source.name
                )));
            }
        }

        for provider in &self.boundary_chain {
            let source = self.source(&provider.source).ok_or_else(|| {
                ReconError::UnknownSource(format!("boundary_chain entry '{provider}': no such source"))
            })?;
            if source.layers.get(provider.layer).is_none() {
                return Err(ReconError::UnknownSource(format!(
                    "boundary_chain entry '{provider}': source has no {} layer",
                    provider.layer
                )));
            }
        }

        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn fips_map(&self) -> Result<CountyFipsMap, ReconError> {
        CountyFipsMap::from_pairs(self.county_fips.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    pub fn override_table(&self) -> Result<OverrideTable, ReconError> {
        OverrideTable::from_entries(&self.overrides)
    }

    /// Color for a county; grey when unconfigured.
    pub fn color_for(&self, county: &str) -> &str {
        let key = normalize(county);
        self.colors
            .iter()
            .find(|(name, _)| normalize(name) == key)
            .map(|(_, color)| color.as_str())
            .unwrap_or("#666666")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r##"
name = "Northern NJ"
target_counties = ["Bergen", "Essex", "Hudson", "Passaic", "Union"]
duplicate_policy = "skip"

[reference]
file = "nj_municipalities.csv"

[county_fips]
"003" = "Bergen"
"005" = "Bergen"
"013" = "Essex"
"017" = "Hudson"
"031" = "Passaic"
"039" = "Union"

[[overrides]]
raw_name = "Washington"
county = "Bergen"
canonical = "Washington_Bergen_003"

[[overrides]]
raw_name = "Washington"
county = "Union"
canonical = "Washington_Union"

[colors]
Bergen = "#00d4ff"
Essex = "#ff6b35"

[scenarios.3_county_core]
name = "3-County Core"
counties = ["Bergen", "Essex", "Hudson"]
description = "Core urban counties"

[[sources]]
name = "tiger"
dir = "tiger_data"
state_column = "STATEFP"
state_fips = "34"

[sources.layers.county_subdivision]
path = "county_subdivisions"
url = "https://www2.census.gov/geo/tiger/TIGER2023/COUSUB/tl_2023_34_cousub.zip"

[sources.layers.county]
path = "counties"

[[boundary_chain]]
source = "tiger"
layer = "county_subdivision"
"##;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Northern NJ");
        assert_eq!(config.target_counties.len(), 5);
        assert_eq!(config.output_dir, "visualizations");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Skip);
        assert_eq!(config.overrides.len(), 2);
        assert_eq!(config.scenarios["3_county_core"].counties.len(), 3);

        let tiger = config.source("tiger").unwrap();
        assert_eq!(tiger.name_column, "NAME");
        assert_eq!(tiger.county_column, "COUNTYFP");
        assert!(tiger.layers.get(SourceLayer::County).is_some());
        assert!(tiger.layers.get(SourceLayer::Municipality).is_none());

        assert_eq!(
            config.boundary_chain,
            vec![ProviderRef { source: "tiger".into(), layer: SourceLayer::CountySubdivision }]
        );

        let fips = config.fips_map().unwrap();
        assert_eq!(fips.county_for("005"), Some("Bergen"));
        assert_eq!(config.color_for("essex"), "#ff6b35");
        assert_eq!(config.color_for("Union"), "#666666");
    }

    #[test]
    fn duplicate_policy_defaults_to_reject() {
        let input = VALID.replace("duplicate_policy = \"skip\"\n", "");
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn reject_bad_fips_code() {
        let input = VALID.replace("\"039\" = \"Union\"", "\"39\" = \"Union\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("three digits"));
    }

    #[test]
    fn reject_fips_outside_targets() {
        let input = VALID.replace("\"039\" = \"Union\"", "\"021\" = \"Mercer\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("not a target county"));
    }

    #[test]
    fn reject_unknown_chain_source() {
        let input = VALID.replace("source = \"tiger\"", "source = \"njdep\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::UnknownSource(_)));
    }

    #[test]
    fn reject_chain_layer_missing_from_source() {
        let input = VALID.replace("layer = \"county_subdivision\"", "layer = \"municipality\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("no municipality layer"));
    }

    #[test]
    fn reject_scenario_with_unknown_county() {
        let input = VALID.replace(
            "counties = [\"Bergen\", \"Essex\", \"Hudson\"]",
            "counties = [\"Bergen\", \"Morris\"]",
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("'Morris'"));
    }

    #[test]
    fn reject_half_state_filter() {
        let input = VALID.replace("state_fips = \"34\"\n", "");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("set together"));
    }

    #[test]
    fn reject_unknown_layer_name() {
        let input = VALID.replace("layer = \"county_subdivision\"", "layer = \"cousub\"");
        assert!(ReconConfig::from_toml(&input).is_err());
    }
}
