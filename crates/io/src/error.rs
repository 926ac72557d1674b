use std::fmt;
use std::path::PathBuf;

use njgeo_recon::{ReconError, SourceLayer};

#[derive(Debug)]
pub enum LoadError {
    /// The layer is not configured, or no boundary file exists where it points.
    SourceNotFound {
        source: String,
        layer: SourceLayer,
        path: PathBuf,
    },
    /// The file loaded but nothing survived the county filter.
    EmptyResult { source: String, layer: SourceLayer },
    Read { path: PathBuf, message: String },
    /// Every provider of a fallback chain failed. Attempts are in chain order.
    Exhausted { attempts: Vec<(String, LoadError)> },
    Download { url: String, message: String },
    Extract { path: PathBuf, message: String },
    Reference(ReconError),
}

impl LoadError {
    /// Errors a fallback chain moves past instead of aborting on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LoadError::SourceNotFound { .. } | LoadError::EmptyResult { .. } | LoadError::Read { .. }
        )
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::SourceNotFound { source, layer, path } => {
                if path.as_os_str().is_empty() {
                    write!(f, "{source}:{layer}: layer not configured")
                } else {
                    write!(f, "{source}:{layer}: no boundary file at {}", path.display())
                }
            }
            LoadError::EmptyResult { source, layer } => {
                write!(f, "{source}:{layer}: no records in the target counties")
            }
            LoadError::Read { path, message } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            LoadError::Exhausted { attempts } => {
                if attempts.is_empty() {
                    return write!(f, "no boundary providers configured");
                }
                write!(f, "all {} boundary providers failed", attempts.len())?;
                for (provider, err) in attempts {
                    write!(f, "\n  {provider}: {err}")?;
                }
                Ok(())
            }
            LoadError::Download { url, message } => write!(f, "download {url} failed: {message}"),
            LoadError::Extract { path, message } => {
                write!(f, "extract {} failed: {message}", path.display())
            }
            LoadError::Reference(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<ReconError> for LoadError {
    fn from(e: ReconError) -> Self {
        LoadError::Reference(e)
    }
}
