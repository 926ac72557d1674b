// Shared loading helpers for the subcommands

use std::path::{Path, PathBuf};

use njgeo_io::LoadError;
use njgeo_recon::reference::LoadWarning;
use njgeo_recon::{CountyFipsMap, ReconConfig, ReferenceTable};

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_NO_SOURCE, EXIT_RUNTIME};
use crate::CliError;

/// A parsed config plus the directory its relative paths resolve against.
pub struct Loaded {
    pub config: ReconConfig,
    pub base_dir: PathBuf,
    pub fips: CountyFipsMap,
}

pub fn load_config(config_path: &Path) -> Result<Loaded, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| CliError {
        code: EXIT_RUNTIME,
        message: format!("cannot read config {}: {e}", config_path.display()),
        hint: None,
    })?;

    let config = ReconConfig::from_toml(&config_str).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: e.to_string(),
        hint: Some(format!("njgeo recon validate {}", config_path.display())),
    })?;
    let fips = config.fips_map().map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: e.to_string(),
        hint: None,
    })?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Loaded { config, base_dir, fips })
}

impl Loaded {
    pub fn reference(&self) -> Result<(ReferenceTable, Vec<LoadWarning>), CliError> {
        let path = self.base_dir.join(&self.config.reference.file);
        let (table, warnings) = njgeo_io::load_reference(&path, &self.config).map_err(load_err)?;
        for w in &warnings {
            eprintln!(
                "warning: reference line {}: duplicate ('{}', '{}') skipped",
                w.line, w.municipality, w.county
            );
        }
        Ok((table, warnings))
    }

    pub fn output_dir(&self, override_dir: Option<PathBuf>) -> PathBuf {
        override_dir.unwrap_or_else(|| self.base_dir.join(&self.config.output_dir))
    }
}

pub fn load_err(e: LoadError) -> CliError {
    let (code, hint) = match &e {
        LoadError::Exhausted { .. } => (
            EXIT_NO_SOURCE,
            Some("run `njgeo fetch <config>` to download boundary files".to_string()),
        ),
        LoadError::SourceNotFound { .. } => (EXIT_NO_SOURCE, None),
        LoadError::EmptyResult { .. }
        | LoadError::Read { .. }
        | LoadError::Download { .. }
        | LoadError::Extract { .. }
        | LoadError::Reference(_) => (EXIT_RUNTIME, None),
    };
    CliError { code, message: e.to_string(), hint }
}

pub fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CliError {
            code: EXIT_RUNTIME,
            message: format!("cannot create {}: {e}", parent.display()),
            hint: None,
        })?;
    }
    std::fs::write(path, contents).map_err(|e| CliError {
        code: EXIT_RUNTIME,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    })
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })
}
