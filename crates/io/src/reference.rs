// Reference CSV loading from disk

use std::path::Path;

use njgeo_recon::reference::LoadWarning;
use njgeo_recon::{ReconConfig, ReferenceTable};

use crate::error::LoadError;

pub fn load_reference(path: &Path, config: &ReconConfig) -> Result<(ReferenceTable, Vec<LoadWarning>), LoadError> {
    let data = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let (table, warnings) = ReferenceTable::from_csv(&data, &config.target_counties, config.duplicate_policy)?;
    log::info!(
        "loaded {} reference rows from {} ({} skipped)",
        table.len(),
        path.display(),
        warnings.len()
    );
    Ok((table, warnings))
}
