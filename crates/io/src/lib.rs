// Boundary and reference file I/O

pub mod error;
pub mod fallback;
pub mod feature;
pub mod json;
pub mod provision;
pub mod reference;
pub mod shp;
pub mod source;

pub use error::LoadError;
pub use fallback::{first_available, load_boundary_chain, load_county_layer};
pub use provision::{ensure_layer, Provisioned};
pub use reference::load_reference;
pub use source::{load_layer, LoadedLayer};
