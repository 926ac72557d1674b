//! `njgeo report`: JSON tables for dashboards.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use njgeo_recon::aggregate::{
    comparisons, county_rollup, demographics, scenario_rollup, CountyRollup,
};
use njgeo_recon::geometry::quality_report;
use njgeo_recon::ReferenceRecord;

use crate::util::{load_config, load_err, to_json, write_output, Loaded};
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Table {
    /// Reference rows in the target counties
    Municipalities,
    /// Per-county population, area and density
    Counties,
    /// Totals for each consolidation scenario
    Scenarios,
    /// Scenarios ranked among the comparison cities
    Comparisons,
    /// Largest, smallest and density extremes plus the size distribution
    Insights,
    /// Geometry validation of the first available boundary layer
    Quality,
}

#[derive(Serialize)]
struct CountyRow<'a> {
    #[serde(flatten)]
    rollup: &'a CountyRollup,
    color: &'a str,
}

pub fn cmd_report(
    config_path: PathBuf,
    table: Table,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let loaded = load_config(&config_path)?;
    let json = build_table(&loaded, table)?;

    match output {
        Some(path) => {
            write_output(&path, &json)?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn build_table(loaded: &Loaded, table: Table) -> Result<String, CliError> {
    let config = &loaded.config;

    match table {
        Table::Quality => {
            let layer = njgeo_io::load_boundary_chain(config, &loaded.base_dir, &loaded.fips)
                .map_err(load_err)?;
            to_json(&quality_report(&layer.records))
        }
        Table::Municipalities => {
            let (reference, _) = loaded.reference()?;
            let rows: Vec<&ReferenceRecord> =
                reference.iter().filter(|r| r.in_target_region).collect();
            to_json(&rows)
        }
        Table::Counties => {
            let (reference, _) = loaded.reference()?;
            let counties = county_rollup(reference.iter());
            let rows: Vec<CountyRow> = counties
                .iter()
                .map(|c| CountyRow { rollup: c, color: config.color_for(&c.county) })
                .collect();
            to_json(&rows)
        }
        Table::Scenarios => {
            let (reference, _) = loaded.reference()?;
            let counties = county_rollup(reference.iter());
            to_json(&scenario_rollup(&config.scenarios, &counties))
        }
        Table::Comparisons => {
            let (reference, _) = loaded.reference()?;
            let scenarios = scenario_rollup(&config.scenarios, &county_rollup(reference.iter()));
            to_json(&comparisons(&config.comparisons, &scenarios))
        }
        Table::Insights => {
            let (reference, _) = loaded.reference()?;
            to_json(&demographics(reference.iter()))
        }
    }
}
