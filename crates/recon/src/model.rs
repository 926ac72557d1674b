use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Boundary side
// ---------------------------------------------------------------------------

/// Geography level a boundary file describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLayer {
    Municipality,
    CountySubdivision,
    County,
}

impl SourceLayer {
    pub const ALL: [SourceLayer; 3] = [Self::Municipality, Self::CountySubdivision, Self::County];
}

impl std::fmt::Display for SourceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Municipality => write!(f, "municipality"),
            Self::CountySubdivision => write!(f, "county_subdivision"),
            Self::County => write!(f, "county"),
        }
    }
}

/// Why a geometry is not usable as-is. Records carrying one are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryIssue {
    /// Null shape or multipolygon without members.
    Empty,
    /// Point or line geometry where a polygon was expected.
    NotAreal,
    /// A ring with fewer than four coordinates.
    TooFewPoints,
    /// Two non-adjacent segments of one ring intersect.
    SelfIntersection,
    ZeroArea,
}

impl std::fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::NotAreal => write!(f, "not_areal"),
            Self::TooFewPoints => write!(f, "too_few_points"),
            Self::SelfIntersection => write!(f, "self_intersection"),
            Self::ZeroArea => write!(f, "zero_area"),
        }
    }
}

/// One feature read from a boundary file.
#[derive(Debug, Clone, Serialize)]
pub struct BoundaryRecord {
    pub raw_name: String,
    /// Three-digit county code; `None` when the source has no county column.
    pub county_fips: Option<String>,
    #[serde(skip_serializing)]
    pub geometry: MultiPolygon<f64>,
    pub source_layer: SourceLayer,
    /// Remaining attribute columns, stringified.
    pub attributes: BTreeMap<String, String>,
    pub geometry_issue: Option<GeometryIssue>,
}

impl BoundaryRecord {
    /// Build a record and flag its geometry.
    pub fn new(
        raw_name: impl Into<String>,
        county_fips: Option<String>,
        geometry: MultiPolygon<f64>,
        source_layer: SourceLayer,
    ) -> Self {
        let geometry_issue = crate::geometry::validate_geometry(&geometry);
        Self {
            raw_name: raw_name.into(),
            county_fips,
            geometry,
            source_layer,
            attributes: BTreeMap::new(),
            geometry_issue,
        }
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Override the computed flag, e.g. when the source geometry was not areal.
    pub fn with_geometry_issue(mut self, issue: Option<GeometryIssue>) -> Self {
        self.geometry_issue = issue;
        self
    }

    pub fn is_geometry_valid(&self) -> bool {
        self.geometry_issue.is_none()
    }
}

// ---------------------------------------------------------------------------
// Reference side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRecord {
    pub municipality_name: String,
    pub county_name: String,
    pub population: u64,
    pub area_sq_miles: f64,
    pub population_density: f64,
    pub in_target_region: bool,
}

impl ReferenceRecord {
    /// Build a record with derived fields computed against `target_counties`.
    pub fn new(
        municipality_name: impl Into<String>,
        county_name: impl Into<String>,
        population: u64,
        area_sq_miles: f64,
        target_counties: &[String],
    ) -> Self {
        let county_name = county_name.into();
        let county_key = crate::normalize::normalize(&county_name);
        let in_target_region = target_counties
            .iter()
            .any(|c| crate::normalize::normalize(c) == county_key);
        Self {
            municipality_name: municipality_name.into(),
            county_name,
            population,
            area_sq_miles,
            population_density: population as f64 / area_sq_miles,
            in_target_region,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

/// Boundary geometry joined with its reference attributes.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledRecord {
    pub raw_name: String,
    pub county_fips: Option<String>,
    pub source_layer: SourceLayer,
    #[serde(skip_serializing)]
    pub geometry: MultiPolygon<f64>,
    pub geometry_issue: Option<GeometryIssue>,
    pub attributes: BTreeMap<String, String>,
    pub municipality_name: String,
    pub county_name: String,
    pub population: u64,
    pub area_sq_miles: f64,
    pub population_density: f64,
    pub in_target_region: bool,
}

impl ReconciledRecord {
    pub fn join(boundary: BoundaryRecord, reference: &ReferenceRecord) -> Self {
        Self {
            raw_name: boundary.raw_name,
            county_fips: boundary.county_fips,
            source_layer: boundary.source_layer,
            geometry: boundary.geometry,
            geometry_issue: boundary.geometry_issue,
            attributes: boundary.attributes,
            municipality_name: reference.municipality_name.clone(),
            county_name: reference.county_name.clone(),
            population: reference.population,
            area_sq_miles: reference.area_sq_miles,
            population_density: reference.population_density,
            in_target_region: reference.in_target_region,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// No reference row carries the lookup key.
    NoReferenceMatch,
    /// County unknown and the name exists under several counties.
    AmbiguousName,
    /// The reference row was already claimed by an earlier boundary.
    DuplicateMatch,
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReferenceMatch => write!(f, "no_reference_match"),
            Self::AmbiguousName => write!(f, "ambiguous_name"),
            Self::DuplicateMatch => write!(f, "duplicate_match"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedBoundary {
    pub record: BoundaryRecord,
    /// County resolved from the FIPS map, if any.
    pub county_name: Option<String>,
    /// Name actually looked up after overrides.
    pub lookup_key: String,
    pub reason: UnmatchedReason,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    pub matched: Vec<ReconciledRecord>,
    pub unmatched_boundaries: Vec<UnmatchedBoundary>,
    pub unmatched_reference: Vec<ReferenceRecord>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Whether the loader could restrict records to the target counties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStatus {
    Applied,
    NotApplied,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub total_boundaries: usize,
    pub total_reference: usize,
    pub matched: usize,
    pub unmatched_boundaries: usize,
    pub unmatched_reference: usize,
    pub invalid_geometries: usize,
    pub matched_population: u64,
    pub unmatched_by_reason: BTreeMap<String, usize>,
    pub matched_by_county: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub source: String,
    pub layer: SourceLayer,
    pub county_filter: FilterStatus,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
}

/// Pre-loaded boundaries plus where they came from.
pub struct ReconInput {
    pub source: String,
    pub layer: SourceLayer,
    pub county_filter: FilterStatus,
    pub boundaries: Vec<BoundaryRecord>,
}
