//! `njgeo fetch`: download and extract the boundary layers a config uses.

use std::path::PathBuf;

use njgeo_io::provision::ensure_layer;
use njgeo_io::{LoadError, Provisioned};
use njgeo_recon::config::ProviderRef;

use crate::exit_codes::{EXIT_NO_SOURCE, EXIT_RUNTIME};
use crate::util::load_config;
use crate::CliError;

pub fn cmd_fetch(config_path: PathBuf) -> Result<(), CliError> {
    let loaded = load_config(&config_path)?;
    let config = &loaded.config;

    // Chain layers first, then every county layer, without repeats.
    let mut providers: Vec<ProviderRef> = Vec::new();
    for p in config
        .boundary_chain
        .iter()
        .cloned()
        .chain(njgeo_io::fallback::county_providers(config))
    {
        if !providers.contains(&p) {
            providers.push(p);
        }
    }

    if providers.is_empty() {
        return Err(CliError {
            code: EXIT_NO_SOURCE,
            message: "config names no boundary layers".into(),
            hint: Some("add [[boundary_chain]] entries or a county layer to a source".into()),
        });
    }

    let mut available = 0usize;
    let mut failures: Vec<(String, LoadError)> = Vec::new();

    for provider in &providers {
        let Some(source) = config.source(&provider.source) else {
            continue;
        };
        match ensure_layer(&loaded.base_dir, source, provider.layer) {
            Ok(outcome) => {
                available += 1;
                let verb = match outcome {
                    Provisioned::AlreadyPresent(_) => "present",
                    Provisioned::Extracted(_) => "extracted",
                    Provisioned::Downloaded(_) => "downloaded",
                };
                eprintln!("{provider}: {verb} ({})", outcome.path().display());
            }
            Err(e) => {
                eprintln!("{provider}: {e}");
                failures.push((provider.to_string(), e));
            }
        }
    }

    eprintln!("{available} of {} layers available", providers.len());

    if available == 0 {
        return Err(CliError {
            code: EXIT_NO_SOURCE,
            message: "no boundary layer could be provisioned".into(),
            hint: Some("set a `url` on the layer or place the extracted files under its path".into()),
        });
    }

    // A download that was attempted and failed is an error even when another
    // provider is available.
    if let Some((provider, e)) = failures.iter().find(|(_, e)| !e.is_recoverable()) {
        return Err(CliError {
            code: EXIT_RUNTIME,
            message: format!("{provider}: {e}"),
            hint: None,
        });
    }

    Ok(())
}
