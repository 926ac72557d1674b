//! `njgeo-recon`: boundary-to-reference reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded boundaries and a reference table,
//! returns matched records plus both unmatched sides. No CLI or file IO.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod fips;
pub mod geometry;
pub mod model;
pub mod normalize;
pub mod overrides;
pub mod reference;

pub use config::ReconConfig;
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use fips::CountyFipsMap;
pub use model::{
    BoundaryRecord, FilterStatus, GeometryIssue, ReconInput, ReconResult, ReconciledRecord,
    Reconciliation, ReferenceRecord, SourceLayer, UnmatchedBoundary, UnmatchedReason,
};
pub use overrides::OverrideTable;
pub use reference::{DuplicatePolicy, ReferenceTable};
