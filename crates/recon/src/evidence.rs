use std::collections::BTreeMap;

use crate::model::{ReconSummary, Reconciliation};

/// Compute summary statistics from a reconciliation pass.
pub fn compute_summary(
    result: &Reconciliation,
    total_boundaries: usize,
    total_reference: usize,
) -> ReconSummary {
    let mut unmatched_by_reason: BTreeMap<String, usize> = BTreeMap::new();
    let mut matched_by_county: BTreeMap<String, usize> = BTreeMap::new();

    for u in &result.unmatched_boundaries {
        *unmatched_by_reason.entry(u.reason.to_string()).or_insert(0) += 1;
    }
    for m in &result.matched {
        *matched_by_county.entry(m.county_name.clone()).or_insert(0) += 1;
    }

    let invalid_geometries = result.matched.iter().filter(|m| m.geometry_issue.is_some()).count()
        + result
            .unmatched_boundaries
            .iter()
            .filter(|u| !u.record.is_geometry_valid())
            .count();

    ReconSummary {
        total_boundaries,
        total_reference,
        matched: result.matched.len(),
        unmatched_boundaries: result.unmatched_boundaries.len(),
        unmatched_reference: result.unmatched_reference.len(),
        invalid_geometries,
        matched_population: result.matched.iter().map(|m| m.population).sum(),
        unmatched_by_reason,
        matched_by_county,
    }
}
