//! Geometry validation and data-quality reporting for loaded boundaries.

use std::collections::BTreeMap;

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BoundingRect, Line, LineString, MultiPolygon};
use serde::Serialize;

use crate::model::{BoundaryRecord, GeometryIssue};

/// Check a multipolygon for the defects renderers care about.
///
/// Returns the first issue found; `None` means the geometry is usable.
pub fn validate_geometry(geometry: &MultiPolygon<f64>) -> Option<GeometryIssue> {
    if geometry.0.is_empty() {
        return Some(GeometryIssue::Empty);
    }

    for polygon in &geometry.0 {
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors().iter());
        for ring in rings {
            if ring.0.len() < 4 {
                return Some(GeometryIssue::TooFewPoints);
            }
            if ring_self_intersects(ring) {
                return Some(GeometryIssue::SelfIntersection);
            }
        }
    }

    if geometry.unsigned_area() == 0.0 {
        return Some(GeometryIssue::ZeroArea);
    }

    None
}

fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    // Repeated vertices would leave zero-length segments between neighbours.
    let mut coords = ring.0.clone();
    coords.dedup();
    let segments: Vec<Line<f64>> = coords.windows(2).map(|w| Line::new(w[0], w[1])).collect();
    let n = segments.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                // Neighbours always share an endpoint; anything else is a crossing.
                Some(LineIntersection::SinglePoint { is_proper, .. }) => {
                    if !adjacent || is_proper {
                        return true;
                    }
                }
                Some(LineIntersection::Collinear { .. }) => return true,
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Quality report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub total_records: usize,
    pub valid_geometries: usize,
    pub empty_geometries: usize,
    pub invalid_by_issue: BTreeMap<String, usize>,
    /// `[min_x, min_y, max_x, max_y]` over all non-empty geometries.
    pub bounds: Option<[f64; 4]>,
}

pub fn quality_report(records: &[BoundaryRecord]) -> QualityReport {
    let mut valid_geometries = 0;
    let mut empty_geometries = 0;
    let mut invalid_by_issue: BTreeMap<String, usize> = BTreeMap::new();
    let mut bounds: Option<[f64; 4]> = None;

    for record in records {
        match record.geometry_issue {
            None => valid_geometries += 1,
            Some(issue) => {
                if issue == GeometryIssue::Empty {
                    empty_geometries += 1;
                }
                *invalid_by_issue.entry(issue.to_string()).or_insert(0) += 1;
            }
        }

        if let Some(rect) = record.geometry.bounding_rect() {
            let (min, max) = (rect.min(), rect.max());
            bounds = Some(match bounds {
                None => [min.x, min.y, max.x, max.y],
                Some([x0, y0, x1, y1]) => {
                    [x0.min(min.x), y0.min(min.y), x1.max(max.x), y1.max(max.y)]
                }
            });
        }
    }

    let invalid: usize = invalid_by_issue.values().sum();
    if invalid > 0 {
        log::warn!("{invalid} of {} boundaries have invalid geometries", records.len());
    }

    QualityReport {
        total_records: records.len(),
        valid_geometries,
        empty_geometries,
        invalid_by_issue,
        bounds,
    }
}
