use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::fips::CountyFipsMap;
use crate::model::{
    BoundaryRecord, ReconInput, ReconMeta, ReconResult, ReconciledRecord, Reconciliation,
    UnmatchedBoundary, UnmatchedReason,
};
use crate::overrides::OverrideTable;
use crate::reference::ReferenceTable;

/// Run reconciliation per config. Returns matched/unmatched sets + summary.
pub fn run(
    config: &ReconConfig,
    reference: &ReferenceTable,
    input: ReconInput,
) -> Result<ReconResult, ReconError> {
    let fips = config.fips_map()?;
    let overrides = config.override_table()?;

    let ReconInput { source, layer, county_filter, boundaries } = input;
    let total_boundaries = boundaries.len();
    let reconciliation = reconcile(boundaries, reference, &overrides, &fips);
    let summary = compute_summary(&reconciliation, total_boundaries, reference.len());

    log::info!(
        "{source}:{layer}: {} matched, {} unmatched boundaries, {} unmatched reference rows",
        summary.matched,
        summary.unmatched_boundaries,
        summary.unmatched_reference,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            source,
            layer,
            county_filter,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        reconciliation,
    })
}

/// Join boundaries to reference rows.
///
/// County-qualified boundaries match on the normalized `(lookup_key, county)`
/// pair, where `lookup_key` comes from the override table. Boundaries without
/// a resolvable county fall back to a name-only match, accepted only when the
/// name is unique across counties. Each reference row is claimed at most once;
/// later claimants are reported as `duplicate_match`. Output order follows
/// input order, so identical inputs give identical results.
pub fn reconcile(
    boundaries: Vec<BoundaryRecord>,
    reference: &ReferenceTable,
    overrides: &OverrideTable,
    fips: &CountyFipsMap,
) -> Reconciliation {
    let mut claimed = vec![false; reference.len()];
    let mut out = Reconciliation::default();

    for boundary in boundaries {
        let county_name = boundary
            .county_fips
            .as_deref()
            .and_then(|code| fips.county_for(code))
            .map(str::to_string);
        let lookup_key = overrides
            .resolve(&boundary.raw_name, county_name.as_deref())
            .to_string();

        let resolved = match county_name.as_deref() {
            Some(county) => reference
                .position(&lookup_key, county)
                .ok_or(UnmatchedReason::NoReferenceMatch),
            None => match reference.candidates_by_name(&lookup_key) {
                [only] => Ok(*only),
                [] => Err(UnmatchedReason::NoReferenceMatch),
                _ => Err(UnmatchedReason::AmbiguousName),
            },
        };

        let reason = match resolved {
            Ok(index) if !claimed[index] => {
                claimed[index] = true;
                // position()/candidates_by_name() only hand out valid indices.
                if let Some(row) = reference.record(index) {
                    out.matched.push(ReconciledRecord::join(boundary, row));
                }
                continue;
            }
            Ok(_) => UnmatchedReason::DuplicateMatch,
            Err(reason) => reason,
        };

        log::debug!(
            "unmatched boundary '{}' (county {:?}, key '{lookup_key}'): {reason}",
            boundary.raw_name,
            county_name
        );
        out.unmatched_boundaries.push(UnmatchedBoundary {
            record: boundary,
            county_name,
            lookup_key,
            reason,
        });
    }

    out.unmatched_reference = reference
        .iter()
        .zip(&claimed)
        .filter(|(_, used)| !**used)
        .map(|(row, _)| row.clone())
        .collect();

    out
}
