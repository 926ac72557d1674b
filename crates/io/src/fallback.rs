//! Ordered provider fallback.

use std::fmt::Display;
use std::path::Path;

use njgeo_recon::config::ProviderRef;
use njgeo_recon::{CountyFipsMap, ReconConfig, SourceLayer};

use crate::error::LoadError;
use crate::source::{load_layer, LoadedLayer};

/// Try each provider in order and return the first success.
///
/// Recoverable failures are logged and the next provider is tried. Any other
/// error aborts the walk. When every provider fails the result is
/// `LoadError::Exhausted` carrying each attempt in order.
pub fn first_available<P, T, F>(providers: &[P], mut attempt: F) -> Result<(usize, T), LoadError>
where
    P: Display,
    F: FnMut(&P) -> Result<T, LoadError>,
{
    let mut attempts = Vec::new();

    for (i, provider) in providers.iter().enumerate() {
        match attempt(provider) {
            Ok(value) => {
                if !attempts.is_empty() {
                    log::info!("using {provider} after {} failed provider(s)", attempts.len());
                }
                return Ok((i, value));
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("{provider}: {e}");
                attempts.push((provider.to_string(), e));
            }
            Err(e) => return Err(e),
        }
    }

    Err(LoadError::Exhausted { attempts })
}

/// Load the first available layer of the config's `boundary_chain`.
pub fn load_boundary_chain(
    config: &ReconConfig,
    base_dir: &Path,
    fips: &CountyFipsMap,
) -> Result<LoadedLayer, LoadError> {
    first_available(&config.boundary_chain, |p: &ProviderRef| {
        let source = config.source(&p.source).ok_or_else(|| LoadError::SourceNotFound {
            source: p.source.clone(),
            layer: p.layer,
            path: Default::default(),
        })?;
        load_layer(base_dir, source, p.layer, fips)
    })
    .map(|(_, layer)| layer)
}

/// Providers of the county layer, in source order.
pub fn county_providers(config: &ReconConfig) -> Vec<ProviderRef> {
    config
        .sources
        .iter()
        .filter(|s| s.layers.county.is_some())
        .map(|s| ProviderRef {
            source: s.name.clone(),
            layer: SourceLayer::County,
        })
        .collect()
}

/// Load the county layer from the first source that has one.
pub fn load_county_layer(
    config: &ReconConfig,
    base_dir: &Path,
    fips: &CountyFipsMap,
) -> Result<LoadedLayer, LoadError> {
    let providers = county_providers(config);
    first_available(&providers, |p| {
        let source = config.source(&p.source).ok_or_else(|| LoadError::SourceNotFound {
            source: p.source.clone(),
            layer: p.layer,
            path: Default::default(),
        })?;
        load_layer(base_dir, source, SourceLayer::County, fips)
    })
    .map(|(_, layer)| layer)
}
