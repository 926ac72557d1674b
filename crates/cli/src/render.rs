//! `njgeo render`: Leaflet maps of the reconciled boundaries.
//!
//! One self-contained HTML document per geography level and scenario, with
//! features embedded as GeoJSON. When a level has no boundary source, a
//! placeholder document is written under the same file name so links from
//! dashboards keep resolving.

use std::path::{Path, PathBuf};

use geo::{BoundingRect, Rect};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use njgeo_recon::{BoundaryRecord, CountyFipsMap, ReconConfig, ReconciledRecord};

use crate::exit_codes::{EXIT_NO_SOURCE, EXIT_RUNTIME};
use crate::util::{load_config, load_err, write_output};
use crate::CliError;

const LEAFLET_VERSION: &str = "1.9.4";

pub const LEVEL_MUNICIPAL: &str = "municipal";
pub const LEVEL_COUNTY: &str = "county";

pub fn map_file_name(level: &str, scenario: Option<&str>) -> String {
    match scenario {
        Some(id) => format!("{level}_{id}_boundaries_map.html"),
        None => format!("{level}_boundaries_map.html"),
    }
}

/// Features plus what the page needs to frame and explain them.
pub struct MapLayer {
    pub title: String,
    pub features: FeatureCollection,
    pub legend: Vec<(String, String)>,
    pub bounds: Option<Rect<f64>>,
}

fn properties(pairs: Vec<(&str, JsonValue)>) -> JsonObject {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn feature(geometry: &geo::MultiPolygon<f64>, props: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(geometry))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn merge_bounds(acc: Option<Rect<f64>>, next: Option<Rect<f64>>) -> Option<Rect<f64>> {
    match (acc, next) {
        (Some(a), Some(b)) => Some(Rect::new(
            geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        )),
        (a, b) => a.or(b),
    }
}

fn legend_for(config: &ReconConfig, counties: &[String]) -> Vec<(String, String)> {
    counties
        .iter()
        .map(|c| (c.clone(), config.color_for(c).to_string()))
        .collect()
}

/// Municipal layer from matched records. Invalid geometries are drawn but flagged.
pub fn municipal_layer(title: &str, records: &[&ReconciledRecord], config: &ReconConfig, counties: &[String]) -> MapLayer {
    let mut bounds = None;
    let features = records
        .iter()
        .filter(|r| !r.geometry.0.is_empty())
        .map(|r| {
            bounds = merge_bounds(bounds, r.geometry.bounding_rect());
            let props = properties(vec![
                ("name", JsonValue::from(r.municipality_name.clone())),
                ("county", JsonValue::from(r.county_name.clone())),
                ("population", JsonValue::from(r.population)),
                ("area_sq_miles", JsonValue::from(r.area_sq_miles)),
                ("population_density", JsonValue::from(r.population_density.round())),
                ("invalid_geometry", JsonValue::from(r.geometry_issue.is_some())),
                ("color", JsonValue::from(config.color_for(&r.county_name))),
            ]);
            feature(&r.geometry, props)
        })
        .collect();

    MapLayer {
        title: title.to_string(),
        features: FeatureCollection { bbox: None, features, foreign_members: None },
        legend: legend_for(config, counties),
        bounds,
    }
}

/// County layer from raw county boundaries, named through the FIPS map.
pub fn county_layer(
    title: &str,
    records: &[&BoundaryRecord],
    fips: &CountyFipsMap,
    config: &ReconConfig,
    counties: &[String],
) -> MapLayer {
    let mut bounds = None;
    let features = records
        .iter()
        .filter(|r| !r.geometry.0.is_empty())
        .map(|r| {
            bounds = merge_bounds(bounds, r.geometry.bounding_rect());
            let county = r
                .county_fips
                .as_deref()
                .and_then(|code| fips.county_for(code))
                .unwrap_or(r.raw_name.as_str());
            let props = properties(vec![
                ("name", JsonValue::from(format!("{county} County"))),
                ("county", JsonValue::from(county)),
                ("invalid_geometry", JsonValue::from(r.geometry_issue.is_some())),
                ("color", JsonValue::from(config.color_for(county))),
            ]);
            feature(&r.geometry, props)
        })
        .collect();

    MapLayer {
        title: title.to_string(),
        features: FeatureCollection { bbox: None, features, foreign_members: None },
        legend: legend_for(config, counties),
        bounds,
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Keep embedded JSON from closing the surrounding script element.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

pub fn map_document(layer: &MapLayer) -> Result<String, serde_json::Error> {
    let data = escape_script(&serde_json::to_string(&layer.features)?);
    let bounds = match layer.bounds {
        Some(r) => format!("[[{}, {}], [{}, {}]]", r.min().y, r.min().x, r.max().y, r.max().x),
        None => "null".to_string(),
    };
    let legend: String = layer
        .legend
        .iter()
        .map(|(county, color)| {
            format!(
                "<p><span style=\"color: {};\">&#9679;</span> {}</p>",
                escape_html(color),
                escape_html(county)
            )
        })
        .collect();

    Ok(MAP_TEMPLATE
        .replace("{{LEAFLET}}", LEAFLET_VERSION)
        .replace("{{TITLE}}", &escape_html(&layer.title))
        .replace("{{LEGEND}}", &legend)
        .replace("{{BOUNDS}}", &bounds)
        .replace("{{DATA}}", &data))
}

pub fn placeholder_document(title: &str, reason: &str) -> String {
    PLACEHOLDER_TEMPLATE
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{REASON}}", &escape_html(reason))
}

const MAP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{{LEAFLET}}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{{LEAFLET}}/dist/leaflet.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; background: #1a1a1a; }
.legend { position: fixed; bottom: 50px; left: 50px; z-index: 9999; background: #2d2d2d;
  border: 2px solid #666666; border-radius: 5px; color: white; padding: 10px; font: 14px sans-serif; }
.legend h4 { margin: 0 0 10px 0; color: #00d4ff; }
.legend p { margin: 2px 0; }
</style>
</head>
<body>
<div id="map"></div>
<div class="legend"><h4>{{TITLE}}</h4>{{LEGEND}}</div>
<script>
var data = {{DATA}};
var bounds = {{BOUNDS}};
var map = L.map('map');
L.tileLayer('https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png', {
  attribution: '&copy; OpenStreetMap contributors &copy; CARTO'
}).addTo(map);
function esc(v) {
  return String(v).replace(/[&<>"]/g, function (c) {
    return { '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' }[c];
  });
}
L.geoJSON(data, {
  style: function (f) {
    return { color: f.properties.color, fillColor: f.properties.color, weight: 2, fillOpacity: 0.6,
             dashArray: f.properties.invalid_geometry ? '4' : null };
  },
  onEachFeature: function (f, layer) {
    var p = f.properties;
    var html = '<h4 style="margin: 0 0 5px 0;">' + esc(p.name) + '</h4>'
      + '<p><strong>County:</strong> ' + esc(p.county) + '</p>';
    if (p.population !== undefined) {
      html += '<p><strong>Population:</strong> ' + Number(p.population).toLocaleString() + '</p>'
        + '<p><strong>Area:</strong> ' + esc(p.area_sq_miles) + ' sq mi</p>'
        + '<p><strong>Density:</strong> ' + Number(p.population_density).toLocaleString() + ' / sq mi</p>';
    }
    if (p.invalid_geometry) {
      html += '<p><em>Boundary geometry failed validation</em></p>';
    }
    layer.bindPopup(html);
  }
}).addTo(map);
if (bounds) { map.fitBounds(bounds); } else { map.setView([40.8, -74.2], 10); }
</script>
</body>
</html>
"#;

const PLACEHOLDER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<style>body { background: #1a1a1a; color: white; font: 16px sans-serif; padding: 40px; }</style>
</head>
<body>
<h2>{{TITLE}}</h2>
<p>Boundary data is unavailable: {{REASON}}</p>
<p>Run <code>njgeo fetch</code> with the same config, then render again.</p>
</body>
</html>
"#;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

fn write_map(dir: &Path, file: &str, html: &str) -> Result<PathBuf, CliError> {
    let path = dir.join(file);
    write_output(&path, html)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

fn render_err(e: serde_json::Error) -> CliError {
    CliError { code: EXIT_RUNTIME, message: format!("GeoJSON serialization error: {e}"), hint: None }
}

pub fn cmd_render(config_path: PathBuf, output_dir: Option<PathBuf>) -> Result<(), CliError> {
    let loaded = load_config(&config_path)?;
    let config = &loaded.config;
    let out_dir = loaded.output_dir(output_dir);
    let (reference, _) = loaded.reference()?;

    let mut written = Vec::new();
    let mut missing = Vec::new();

    // Municipal level
    let title = format!("{} Municipal Boundaries", config.name);
    match njgeo_io::load_boundary_chain(config, &loaded.base_dir, &loaded.fips) {
        Ok(layer) => {
            let result = njgeo_recon::run(config, &reference, layer.into_input())
                .map_err(|e| CliError { code: EXIT_RUNTIME, message: e.to_string(), hint: None })?;
            let matched = &result.reconciliation.matched;

            let all: Vec<&ReconciledRecord> = matched.iter().collect();
            let doc = map_document(&municipal_layer(&title, &all, config, &config.target_counties))
                .map_err(render_err)?;
            written.push(write_map(&out_dir, &map_file_name(LEVEL_MUNICIPAL, None), &doc)?);

            for (id, scenario) in &config.scenarios {
                let members: Vec<&ReconciledRecord> = matched
                    .iter()
                    .filter(|r| in_counties(&r.county_name, &scenario.counties))
                    .collect();
                let layer = municipal_layer(&scenario.name, &members, config, &scenario.counties);
                let doc = map_document(&layer).map_err(render_err)?;
                written.push(write_map(&out_dir, &map_file_name(LEVEL_MUNICIPAL, Some(id)), &doc)?);
            }
        }
        Err(e) => {
            log::warn!("municipal maps: {e}");
            let reason = e.to_string();
            written.push(write_map(&out_dir, &map_file_name(LEVEL_MUNICIPAL, None), &placeholder_document(&title, &reason))?);
            for (id, scenario) in &config.scenarios {
                let doc = placeholder_document(&scenario.name, &reason);
                written.push(write_map(&out_dir, &map_file_name(LEVEL_MUNICIPAL, Some(id)), &doc)?);
            }
            missing.push(e);
        }
    }

    // County level
    let title = format!("{} County Boundaries", config.name);
    match njgeo_io::load_county_layer(config, &loaded.base_dir, &loaded.fips) {
        Ok(layer) => {
            let all: Vec<&BoundaryRecord> = layer.records.iter().collect();
            let doc = map_document(&county_layer(&title, &all, &loaded.fips, config, &config.target_counties))
                .map_err(render_err)?;
            written.push(write_map(&out_dir, &map_file_name(LEVEL_COUNTY, None), &doc)?);

            for (id, scenario) in &config.scenarios {
                let members: Vec<&BoundaryRecord> = layer
                    .records
                    .iter()
                    .filter(|r| {
                        r.county_fips
                            .as_deref()
                            .and_then(|code| loaded.fips.county_for(code))
                            .map(|county| in_counties(county, &scenario.counties))
                            .unwrap_or(false)
                    })
                    .collect();
                let layer = county_layer(&scenario.name, &members, &loaded.fips, config, &scenario.counties);
                let doc = map_document(&layer).map_err(render_err)?;
                written.push(write_map(&out_dir, &map_file_name(LEVEL_COUNTY, Some(id)), &doc)?);
            }
        }
        Err(e) => {
            log::warn!("county maps: {e}");
            let reason = e.to_string();
            written.push(write_map(&out_dir, &map_file_name(LEVEL_COUNTY, None), &placeholder_document(&title, &reason))?);
            for (id, scenario) in &config.scenarios {
                let doc = placeholder_document(&scenario.name, &reason);
                written.push(write_map(&out_dir, &map_file_name(LEVEL_COUNTY, Some(id)), &doc)?);
            }
            missing.push(e);
        }
    }

    eprintln!("wrote {} maps to {}", written.len(), out_dir.display());

    // Placeholders are in place; still report that no source was available.
    if missing.len() == 2 {
        let mut err = load_err(missing.remove(0));
        err.code = EXIT_NO_SOURCE;
        return Err(err);
    }
    Ok(())
}

fn in_counties(county: &str, counties: &[String]) -> bool {
    let key = njgeo_recon::normalize::normalize(county);
    counties.iter().any(|c| njgeo_recon::normalize::normalize(c) == key)
}
