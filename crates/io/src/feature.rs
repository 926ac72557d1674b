// Format-neutral feature produced by the shapefile and GeoJSON readers

use std::collections::BTreeMap;

use geo::{Geometry, MultiPolygon};

#[derive(Debug, Clone)]
pub struct RawFeature {
    /// Attribute columns, stringified. Missing values are empty strings.
    pub properties: BTreeMap<String, String>,
    pub geometry: MultiPolygon<f64>,
    /// The source geometry was a point or line, not a polygon.
    pub not_areal: bool,
}

impl RawFeature {
    pub fn new(properties: BTreeMap<String, String>, geometry: Option<Geometry<f64>>) -> Self {
        match geometry.map(into_multipolygon) {
            Some(Some(mp)) => RawFeature { properties, geometry: mp, not_areal: false },
            Some(None) => RawFeature {
                properties,
                geometry: MultiPolygon::new(vec![]),
                not_areal: true,
            },
            None => RawFeature { properties, geometry: MultiPolygon::new(vec![]), not_areal: false },
        }
    }

    pub fn property(&self, column: &str) -> Option<&str> {
        self.properties.get(column).map(String::as_str)
    }
}

/// Polygons become single-member multipolygons. `None` when nothing areal remains.
fn into_multipolygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .into_iter()
                .filter_map(into_multipolygon)
                .flat_map(|mp| mp.0)
                .collect();
            if polygons.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polygons))
            }
        }
        _ => None,
    }
}

/// Zero-pad short numeric codes: `13` and `"13"` both become `"013"`.
pub fn normalize_code(value: &str, width: usize) -> String {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.len() < width && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        format!("{trimmed:0>width$}")
    } else {
        trimmed.to_string()
    }
}
