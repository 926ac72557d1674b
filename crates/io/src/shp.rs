// ESRI shapefile reader (.shp + .dbf)

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use shapefile::dbase::FieldValue;
use shapefile::Shape;

use crate::error::LoadError;
use crate::feature::RawFeature;

pub fn read_features(path: &Path) -> Result<Vec<RawFeature>, LoadError> {
    let mut reader = shapefile::Reader::from_path(path).map_err(|e| read_error(path, e))?;
    let mut features = Vec::new();

    for item in reader.iter_shapes_and_records() {
        let (shape, record) = item.map_err(|e| read_error(path, e))?;
        let fields: HashMap<String, FieldValue> = record.into();
        let properties: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(name, value)| (name, field_to_string(value)))
            .collect();

        let geometry = match shape {
            Shape::NullShape => None,
            other => Some(geo::Geometry::<f64>::try_from(other).map_err(|e| read_error(path, e))?),
        };
        features.push(RawFeature::new(properties, geometry));
    }

    log::debug!("read {} shapes from {}", features.len(), path.display());
    Ok(features)
}

fn read_error(path: &Path, e: impl std::fmt::Display) -> LoadError {
    LoadError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn field_to_string(value: FieldValue) -> String {
    match value {
        FieldValue::Character(s) => s.map(|s| s.trim().to_string()).unwrap_or_default(),
        FieldValue::Numeric(n) => n.map(format_number).unwrap_or_default(),
        FieldValue::Float(n) => n.map(|n| format_number(n as f64)).unwrap_or_default(),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Double(n) => format_number(n),
        FieldValue::Logical(b) => b.map(|b| b.to_string()).unwrap_or_default(),
        FieldValue::Memo(s) => s,
        _ => String::new(),
    }
}

/// Whole numbers print without a fraction so numeric code columns stay comparable.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
