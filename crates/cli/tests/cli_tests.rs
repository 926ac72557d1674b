// End-to-end tests for the njgeo binary.
// Run with: cargo test -p njgeo-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn njgeo() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_njgeo"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn run(args: &[&str]) -> Output {
    njgeo().args(args).output().expect("failed to run njgeo")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn demo_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/northern-nj/northern-nj.toml")
}

const CONFIG: &str = r##"
name = "CLI test"
target_counties = ["Bergen", "Essex", "Hudson"]
duplicate_policy = "skip"

[reference]
file = "reference.csv"

[county_fips]
"003" = "Bergen"
"013" = "Essex"
"017" = "Hudson"

[[overrides]]
raw_name = "Washington"
county = "Bergen"
canonical = "Washington_Bergen_003"

[colors]
Bergen = "#00d4ff"
Essex = "#ff6b35"
Hudson = "#00ff88"

[scenarios.core]
name = "Core"
counties = ["Essex", "Hudson"]

[[comparisons]]
city = "Chicago"
population = 2693976

[[comparisons]]
city = "Tiny Town"
population = 10

[[sources]]
name = "state"
dir = "data/state"

[sources.layers.municipality]
path = "municipal"

[[sources]]
name = "local"
dir = "data/local"

[sources.layers.municipality]
path = "municipal"

[sources.layers.county]
path = "county"

[[boundary_chain]]
source = "state"
layer = "municipality"

[[boundary_chain]]
source = "local"
layer = "municipality"
"##;

const REFERENCE: &str = "\
municipality,county,population_2020,area_sq_miles
Newark,Essex,311549,26.1
Jersey City,Hudson,292449,14.8
Washington_Bergen_003,Bergen,9101,2.9
Hackensack,Bergen,46000,4.3
Princeton,Mercer,30681,18.4
";

fn square(x: f64) -> String {
    format!(
        r#"{{"type":"Polygon","coordinates":[[[{x},40.7],[{x1},40.7],[{x1},40.8],[{x},40.8],[{x},40.7]]]}}"#,
        x = x,
        x1 = x + 0.05
    )
}

fn collection(features: &[(&str, &str, f64)]) -> String {
    let body: Vec<String> = features
        .iter()
        .map(|(name, fips, x)| {
            format!(
                r#"{{"type":"Feature","properties":{{"NAME":"{name}","COUNTYFP":"{fips}"}},"geometry":{}}}"#,
                square(*x)
            )
        })
        .collect();
    format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, body.join(","))
}

/// Config, reference table and a local municipal layer in a temp dir.
fn workspace(with_boundaries: bool) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("study.toml");
    std::fs::write(&config, CONFIG).unwrap();
    std::fs::write(dir.path().join("reference.csv"), REFERENCE).unwrap();

    if with_boundaries {
        let municipal = dir.path().join("data/local/municipal");
        std::fs::create_dir_all(&municipal).unwrap();
        std::fs::write(
            municipal.join("municipal.geojson"),
            collection(&[
                ("Newark", "013", -74.2),
                ("Jersey City", "017", -74.1),
                ("Washington", "003", -74.0),
                ("Mystery Town", "013", -74.3),
            ]),
        )
        .unwrap();

        let county = dir.path().join("data/local/county");
        std::fs::create_dir_all(&county).unwrap();
        std::fs::write(
            county.join("county.geojson"),
            collection(&[("Essex", "013", -74.25), ("Hudson", "017", -74.08), ("Bergen", "003", -74.05)]),
        )
        .unwrap();
    }

    (dir, config)
}

// ===========================================================================
// recon
// ===========================================================================

#[test]
fn recon_run_json_reports_matches() {
    let (_dir, config) = workspace(true);
    let out = run(&["recon", "run", config.to_str().unwrap(), "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["meta"]["source"], "local");
    assert_eq!(json["meta"]["layer"], "municipality");
    assert_eq!(json["summary"]["matched"], 3);
    assert_eq!(json["summary"]["unmatched_boundaries"], 1);
    assert_eq!(json["unmatched_boundaries"][0]["record"]["raw_name"], "Mystery Town");
    assert_eq!(json["unmatched_boundaries"][0]["reason"], "no_reference_match");

    let matched: Vec<&str> = json["matched"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["municipality_name"].as_str().unwrap())
        .collect();
    assert_eq!(matched, vec!["Newark", "Jersey City", "Washington_Bergen_003"]);

    let err = stderr(&out);
    assert!(err.contains("3 matched"), "stderr: {err}");
}

#[test]
fn recon_run_writes_output_file() {
    let (dir, config) = workspace(true);
    let output = dir.path().join("out/result.json");
    let out = run(&["recon", "run", config.to_str().unwrap(), "--output", output.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(out.stdout.is_empty());

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["meta"]["config_name"], "CLI test");
}

#[test]
fn fail_on_unmatched_exits_5() {
    let (_dir, config) = workspace(true);
    let out = run(&["recon", "run", config.to_str().unwrap(), "--fail-on-unmatched"]);
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("unmatched records found"));
}

#[test]
fn no_boundary_source_exits_6() {
    let (_dir, config) = workspace(false);
    let out = run(&["recon", "run", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(6));
    let err = stderr(&out);
    assert!(err.contains("all 2 boundary providers failed"), "stderr: {err}");
    assert!(err.contains("njgeo fetch"));
}

#[test]
fn invalid_config_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, CONFIG.replace("[[boundary_chain]]\nsource = \"state\"", "[[boundary_chain]]\nsource = \"nowhere\"")).unwrap();

    let out = run(&["recon", "validate", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("no such source"));
}

#[test]
fn validate_accepts_demo_config() {
    let out = run(&["recon", "validate", demo_config().to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("config valid: Northern New Jersey"));
    assert!(err.contains("nj_state:municipality -> tiger:county_subdivision -> sample:municipality"));
}

#[test]
fn missing_config_file_is_runtime_error() {
    let out = run(&["recon", "run", "/definitely/not/here.toml"]);
    assert_eq!(out.status.code(), Some(4));
}

// ===========================================================================
// render
// ===========================================================================

#[test]
fn render_writes_region_and_scenario_maps() {
    let (dir, config) = workspace(true);
    let out = run(&["render", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let maps = dir.path().join("visualizations");
    let region = std::fs::read_to_string(maps.join("municipal_boundaries_map.html")).unwrap();
    assert!(region.contains("Jersey City"));
    assert!(region.contains("Washington_Bergen_003"));
    assert!(!region.contains("Mystery Town"));

    let core = std::fs::read_to_string(maps.join("municipal_core_boundaries_map.html")).unwrap();
    assert!(core.contains("Newark"));
    assert!(!core.contains("Washington_Bergen_003"));

    let county = std::fs::read_to_string(maps.join("county_boundaries_map.html")).unwrap();
    assert!(county.contains("Essex County"));
    assert!(maps.join("county_core_boundaries_map.html").is_file());
}

#[test]
fn render_without_sources_writes_placeholders() {
    let (dir, config) = workspace(false);
    let out_dir = dir.path().join("maps");
    let out = run(&["render", config.to_str().unwrap(), "--output-dir", out_dir.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(6));

    for name in [
        "municipal_boundaries_map.html",
        "municipal_core_boundaries_map.html",
        "county_boundaries_map.html",
        "county_core_boundaries_map.html",
    ] {
        let html = std::fs::read_to_string(out_dir.join(name)).unwrap();
        assert!(html.contains("Boundary data is unavailable"), "{name}");
    }
}

// ===========================================================================
// report
// ===========================================================================

fn report(config: &Path, table: &str) -> serde_json::Value {
    let out = run(&["report", config.to_str().unwrap(), "--table", table]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn report_tables() {
    let (_dir, config) = workspace(true);

    let municipalities = report(&config, "municipalities");
    assert_eq!(municipalities.as_array().unwrap().len(), 4);

    let counties = report(&config, "counties");
    let counties = counties.as_array().unwrap();
    assert_eq!(counties.len(), 3);
    assert_eq!(counties[0]["county"], "Bergen");
    assert_eq!(counties[0]["municipalities"], 2);
    assert_eq!(counties[0]["color"], "#00d4ff");

    let scenarios = report(&config, "scenarios");
    assert_eq!(scenarios[0]["id"], "core");
    assert_eq!(scenarios[0]["population"], 311549 + 292449);

    let ranked = report(&config, "comparisons");
    let names: Vec<&str> = ranked.as_array().unwrap().iter().map(|r| r["city"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Chicago", "Core", "Tiny Town"]);
    assert_eq!(ranked[1]["consolidated"], true);

    let insights = report(&config, "insights");
    assert_eq!(insights["target_region_municipalities"], 4);
    assert_eq!(insights["largest"]["municipality"], "Newark");
    assert_eq!(insights["smallest"]["municipality"], "Washington_Bergen_003");
    assert_eq!(insights["size_distribution"][0]["class"], "small");
    assert_eq!(insights["size_distribution"][0]["municipalities"], 1);
    assert_eq!(insights["size_distribution"][1]["municipalities"], 1);

    let quality = report(&config, "quality");
    assert_eq!(quality["total_records"], 4);
    assert_eq!(quality["valid_geometries"], 4);
}

#[test]
fn demo_overrides_point_at_reference_rows() {
    let text = std::fs::read_to_string(demo_config()).unwrap();
    let config: toml::Value = toml::from_str(&text).unwrap();
    let overrides = config["overrides"].as_array().unwrap();
    assert!(!overrides.is_empty());

    let rows = report(&demo_config(), "municipalities");
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["municipality_name"].as_str().unwrap())
        .collect();
    for entry in overrides {
        let canonical = entry["canonical"].as_str().unwrap();
        assert!(names.contains(&canonical), "no reference row for {canonical}");
    }
}

#[test]
fn unknown_table_is_usage_error() {
    let (_dir, config) = workspace(true);
    let out = run(&["report", config.to_str().unwrap(), "--table", "planets"]);
    assert_eq!(out.status.code(), Some(2));
}

// ===========================================================================
// fetch
// ===========================================================================

#[test]
fn fetch_reports_present_and_missing_layers() {
    let (_dir, config) = workspace(true);
    let out = run(&["fetch", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let err = stderr(&out);
    assert!(err.contains("local:municipality: present"), "stderr: {err}");
    assert!(err.contains("local:county: present"), "stderr: {err}");
    assert!(err.contains("state:municipality: "), "stderr: {err}");
    assert!(err.contains("2 of 3 layers available"), "stderr: {err}");
}

#[test]
fn fetch_with_nothing_available_exits_6() {
    let (_dir, config) = workspace(false);
    let out = run(&["fetch", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(6));
}

#[test]
fn no_subcommand_prints_usage() {
    let out = run(&[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Usage: njgeo"));
}
