//! `njgeo recon`: join boundary files to the reference table.

use std::path::PathBuf;

use clap::Subcommand;

use crate::exit_codes::{EXIT_RUNTIME, EXIT_UNMATCHED};
use crate::util::{load_config, load_err, to_json, write_output};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile the first available boundary layer against the reference table
    #[command(after_help = "\
Examples:
  njgeo recon run northern-nj.toml
  njgeo recon run northern-nj.toml --json
  njgeo recon run northern-nj.toml --output result.json
  njgeo recon run northern-nj.toml --fail-on-unmatched")]
    Run {
        /// Path to the TOML config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit 5 when any boundary or in-region reference row is unmatched
        #[arg(long)]
        fail_on_unmatched: bool,
    },

    /// Validate a config without loading any data
    #[command(after_help = "\
Examples:
  njgeo recon validate northern-nj.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output, fail_on_unmatched } => {
            cmd_recon_run(config, json, output, fail_on_unmatched)
        }
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_on_unmatched: bool,
) -> Result<(), CliError> {
    let loaded = load_config(&config_path)?;
    let (reference, _) = loaded.reference()?;

    let layer = njgeo_io::load_boundary_chain(&loaded.config, &loaded.base_dir, &loaded.fips)
        .map_err(load_err)?;
    let path = layer.path.clone();

    let result = njgeo_recon::run(&loaded.config, &reference, layer.into_input())
        .map_err(|e| CliError { code: EXIT_RUNTIME, message: e.to_string(), hint: None })?;

    let json_str = to_json(&result)?;

    if let Some(ref path) = output_file {
        write_output(path, &json_str)?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    let unmatched_in_region = result
        .reconciliation
        .unmatched_reference
        .iter()
        .filter(|r| r.in_target_region)
        .count();

    eprintln!("boundaries: {}:{} ({})", result.meta.source, result.meta.layer, path.display());
    eprintln!(
        "{} boundaries, {} reference rows: {} matched, {} unmatched boundaries, {} unmatched reference ({} in region)",
        s.total_boundaries,
        s.total_reference,
        s.matched,
        s.unmatched_boundaries,
        s.unmatched_reference,
        unmatched_in_region,
    );
    for (reason, count) in &s.unmatched_by_reason {
        eprintln!("  {reason}: {count}");
    }
    if s.invalid_geometries > 0 {
        eprintln!("{} records carry invalid geometry", s.invalid_geometries);
    }

    if fail_on_unmatched && (s.unmatched_boundaries > 0 || unmatched_in_region > 0) {
        return Err(CliError {
            code: EXIT_UNMATCHED,
            message: "unmatched records found".into(),
            hint: Some("add an [[overrides]] entry for names that differ between sources".into()),
        });
    }

    Ok(())
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let loaded = load_config(&config_path)?;
    let config = &loaded.config;

    let chain: Vec<String> = config.boundary_chain.iter().map(|p| p.to_string()).collect();
    eprintln!("config valid: {}", config.name);
    eprintln!("  target counties: {}", config.target_counties.join(", "));
    eprintln!("  FIPS codes: {}", loaded.fips.len());
    eprintln!("  overrides: {}", config.overrides.len());
    eprintln!("  scenarios: {}", config.scenarios.len());
    if chain.is_empty() {
        eprintln!("  boundary chain: (empty)");
    } else {
        eprintln!("  boundary chain: {}", chain.join(" -> "));
    }

    Ok(())
}
