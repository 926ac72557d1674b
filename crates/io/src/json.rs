// GeoJSON reader

use std::collections::BTreeMap;
use std::path::Path;

use geojson::GeoJson;

use crate::error::LoadError;
use crate::feature::RawFeature;

pub fn read_features(path: &Path) -> Result<Vec<RawFeature>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_features(&text).map_err(|message| LoadError::Read {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_features(text: &str) -> Result<Vec<RawFeature>, String> {
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| e.to_string())?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => return Err("expected a Feature or FeatureCollection".into()),
    };

    features
        .into_iter()
        .map(|feature| {
            let properties: BTreeMap<String, String> = feature
                .properties
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, value_to_string(v)))
                .collect();

            let geometry = match feature.geometry {
                Some(g) => Some(geo::Geometry::<f64>::try_from(g.value).map_err(|e| e.to_string())?),
                None => None,
            };
            Ok(RawFeature::new(properties, geometry))
        })
        .collect()
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}
