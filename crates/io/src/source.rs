//! Boundary layer loading.
//!
//! A layer lives in `<base>/<source.dir>/<layer.path>`, either a boundary file
//! or a directory holding one. Directories are scanned in sorted order and the
//! first `.shp`, `.geojson` or `.json` file wins.

use std::path::{Path, PathBuf};

use njgeo_recon::config::SourceConfig;
use njgeo_recon::{BoundaryRecord, CountyFipsMap, FilterStatus, GeometryIssue, ReconInput, SourceLayer};

use crate::error::LoadError;
use crate::feature::{normalize_code, RawFeature};

const BOUNDARY_EXTENSIONS: [&str; 3] = ["shp", "geojson", "json"];

/// Records of one layer after state and county filtering.
#[derive(Debug)]
pub struct LoadedLayer {
    pub source: String,
    pub layer: SourceLayer,
    pub path: PathBuf,
    pub county_filter: FilterStatus,
    pub records: Vec<BoundaryRecord>,
}

impl LoadedLayer {
    pub fn into_input(self) -> ReconInput {
        ReconInput {
            source: self.source,
            layer: self.layer,
            county_filter: self.county_filter,
            boundaries: self.records,
        }
    }
}

/// Directory (or file) a layer is expected at. `None` if the source lacks the layer.
pub fn layer_path(base_dir: &Path, source: &SourceConfig, layer: SourceLayer) -> Option<PathBuf> {
    source
        .layers
        .get(layer)
        .map(|l| base_dir.join(&source.dir).join(&l.path))
}

/// Locate the boundary file for a layer path.
pub fn find_boundary_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return has_boundary_extension(path).then(|| path.to_path_buf());
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_boundary_extension(p))
        .collect();
    entries.sort();
    entries.into_iter().next()
}

fn has_boundary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| BOUNDARY_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

pub fn read_boundary_file(path: &Path) -> Result<Vec<RawFeature>, LoadError> {
    let is_shp = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("shp"))
        .unwrap_or(false);
    if is_shp {
        crate::shp::read_features(path)
    } else {
        crate::json::read_features(path)
    }
}

/// Load one layer of one source, restricted to the counties in `fips`.
pub fn load_layer(
    base_dir: &Path,
    source: &SourceConfig,
    layer: SourceLayer,
    fips: &CountyFipsMap,
) -> Result<LoadedLayer, LoadError> {
    let not_found = |path: PathBuf| LoadError::SourceNotFound {
        source: source.name.clone(),
        layer,
        path,
    };

    let dir = layer_path(base_dir, source, layer).ok_or_else(|| not_found(PathBuf::new()))?;
    let file = find_boundary_file(&dir).ok_or_else(|| not_found(dir.clone()))?;

    let features = read_boundary_file(&file)?;
    let total = features.len();

    if !features.is_empty() && !features.iter().any(|f| f.property(&source.name_column).is_some()) {
        return Err(LoadError::Read {
            path: file,
            message: format!("missing name column '{}'", source.name_column),
        });
    }

    let features: Vec<RawFeature> = match (&source.state_column, &source.state_fips) {
        (Some(column), Some(state)) => {
            let state = normalize_code(state, 2);
            features
                .into_iter()
                .filter(|f| f.property(column).map(|v| normalize_code(v, 2)) == Some(state.clone()))
                .collect()
        }
        _ => features,
    };

    let has_county_column = features.iter().any(|f| f.property(&source.county_column).is_some());
    let county_filter = if has_county_column {
        FilterStatus::Applied
    } else {
        log::warn!(
            "{}:{}: no '{}' column; county filter not applied",
            source.name,
            layer,
            source.county_column
        );
        FilterStatus::NotApplied
    };

    let records: Vec<BoundaryRecord> = features
        .into_iter()
        .filter_map(|f| {
            let county_fips = if has_county_column {
                let code = normalize_code(f.property(&source.county_column).unwrap_or_default(), 3);
                if !fips.contains_code(&code) {
                    return None;
                }
                Some(code)
            } else {
                None
            };
            Some(into_record(f, &source.name_column, county_fips, layer))
        })
        .collect();

    log::info!(
        "{}:{}: kept {} of {} features from {}",
        source.name,
        layer,
        records.len(),
        total,
        file.display()
    );

    if records.is_empty() {
        return Err(LoadError::EmptyResult {
            source: source.name.clone(),
            layer,
        });
    }

    Ok(LoadedLayer {
        source: source.name.clone(),
        layer,
        path: file,
        county_filter,
        records,
    })
}

fn into_record(
    mut feature: RawFeature,
    name_column: &str,
    county_fips: Option<String>,
    layer: SourceLayer,
) -> BoundaryRecord {
    let raw_name = feature.properties.remove(name_column).unwrap_or_default();
    let not_areal = feature.not_areal;
    let record = BoundaryRecord::new(raw_name, county_fips, feature.geometry, layer)
        .with_attributes(feature.properties);
    if not_areal {
        record.with_geometry_issue(Some(GeometryIssue::NotAreal))
    } else {
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_scan_picks_first_boundary_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();
        std::fs::write(dir.path().join("b.geojson"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();

        let found = find_boundary_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "a.json");
    }

    #[test]
    fn empty_dir_has_no_boundary_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_boundary_file(dir.path()).is_none());
        assert!(find_boundary_file(&dir.path().join("missing")).is_none());
    }
}
