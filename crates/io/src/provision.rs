//! Download and extract boundary archives, skipping work already done.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use njgeo_recon::config::SourceConfig;
use njgeo_recon::SourceLayer;

use crate::error::LoadError;
use crate::source::layer_path;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("njgeo/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    /// The extracted directory already existed.
    AlreadyPresent(PathBuf),
    /// Extracted from an archive found on disk.
    Extracted(PathBuf),
    /// Downloaded from the layer's URL, then extracted.
    Downloaded(PathBuf),
}

impl Provisioned {
    pub fn path(&self) -> &Path {
        match self {
            Provisioned::AlreadyPresent(p) | Provisioned::Extracted(p) | Provisioned::Downloaded(p) => p,
        }
    }
}

/// `<dir>.zip` next to the extracted directory.
pub fn archive_path(dir: &Path) -> PathBuf {
    let mut s = dir.as_os_str().to_owned();
    s.push(".zip");
    PathBuf::from(s)
}

/// Make sure the layer's directory exists, extracting or downloading as needed.
pub fn ensure_layer(base_dir: &Path, source: &SourceConfig, layer: SourceLayer) -> Result<Provisioned, LoadError> {
    let not_found = |path: PathBuf| LoadError::SourceNotFound {
        source: source.name.clone(),
        layer,
        path,
    };

    let layer_cfg = source.layers.get(layer).ok_or_else(|| not_found(PathBuf::new()))?;
    let dir = layer_path(base_dir, source, layer).ok_or_else(|| not_found(PathBuf::new()))?;

    if is_populated(&dir) {
        log::debug!("{}:{layer}: {} already present", source.name, dir.display());
        return Ok(Provisioned::AlreadyPresent(dir));
    }

    let archive = archive_path(&dir);
    if archive.is_file() {
        extract(&archive, &dir)?;
        log::info!("{}:{layer}: extracted {}", source.name, archive.display());
        return Ok(Provisioned::Extracted(dir));
    }

    match &layer_cfg.url {
        Some(url) => {
            download(url, &archive)?;
            extract(&archive, &dir)?;
            log::info!("{}:{layer}: downloaded {url}", source.name);
            Ok(Provisioned::Downloaded(dir))
        }
        None => Err(not_found(dir)),
    }
}

fn is_populated(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

pub fn extract(archive: &Path, dir: &Path) -> Result<(), LoadError> {
    let extract_err = |message: String| LoadError::Extract {
        path: archive.to_path_buf(),
        message,
    };

    let file = File::open(archive).map_err(|e| extract_err(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;
    std::fs::create_dir_all(dir).map_err(|e| extract_err(e.to_string()))?;
    zip.extract(dir).map_err(|e| extract_err(e.to_string()))?;
    Ok(())
}

fn download(url: &str, dest: &Path) -> Result<(), LoadError> {
    let download_err = |message: String| LoadError::Download {
        url: url.to_string(),
        message,
    };

    log::info!("downloading {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| download_err(e.to_string()))?;

    let resp = client.get(url).send().map_err(|e| download_err(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(download_err(format!("HTTP {}", status.as_u16())));
    }
    let bytes = resp.bytes().map_err(|e| download_err(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| download_err(e.to_string()))?;
    }
    let mut out = File::create(dest).map_err(|e| download_err(e.to_string()))?;
    out.write_all(&bytes).map_err(|e| download_err(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use njgeo_recon::config::{LayerConfig, SourceLayers};

    fn source(url: Option<&str>) -> SourceConfig {
        SourceConfig {
            name: "state".into(),
            dir: "data/state".into(),
            name_column: "NAME".into(),
            county_column: "COUNTYFP".into(),
            state_column: None,
            state_fips: None,
            layers: SourceLayers {
                municipality: Some(LayerConfig {
                    path: "municipal".into(),
                    url: url.map(String::from),
                }),
                ..Default::default()
            },
        }
    }

    fn write_zip(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("municipal.geojson", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(br#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn existing_directory_is_left_alone() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("data/state/municipal");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("municipal.geojson"), "{}").unwrap();

        let outcome = ensure_layer(base.path(), &source(None), SourceLayer::Municipality).unwrap();
        assert_eq!(outcome, Provisioned::AlreadyPresent(dir));
    }

    #[test]
    fn archive_on_disk_is_extracted() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("data/state/municipal");
        write_zip(&archive_path(&dir));

        let outcome = ensure_layer(base.path(), &source(None), SourceLayer::Municipality).unwrap();
        assert_eq!(outcome, Provisioned::Extracted(dir.clone()));
        assert!(dir.join("municipal.geojson").is_file());

        // Second run does nothing.
        let again = ensure_layer(base.path(), &source(None), SourceLayer::Municipality).unwrap();
        assert_eq!(again, Provisioned::AlreadyPresent(dir));
    }

    #[test]
    fn nothing_to_fetch_is_not_found() {
        let base = tempfile::tempdir().unwrap();
        let err = ensure_layer(base.path(), &source(None), SourceLayer::Municipality).unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound { .. }));

        let err = ensure_layer(base.path(), &source(None), SourceLayer::County).unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound { .. }));
    }

    #[test]
    fn corrupt_archive_is_extract_error() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("data/state/municipal");
        let archive = archive_path(&dir);
        std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
        std::fs::write(&archive, b"not a zip").unwrap();

        let err = ensure_layer(base.path(), &source(None), SourceLayer::Municipality).unwrap_err();
        assert!(matches!(err, LoadError::Extract { .. }));
    }
}
