//! Loading of subset specifications.
//!
//! The specification itself is produced by the mapping-spreadsheet tooling
//! as a subset JSON file; inclusion lists may be supplied separately and
//! are attached by returning a new specification.

pub mod error;
pub mod inclusions;
pub mod legacy;

pub use error::{IngestError, Result};
pub use inclusions::{apply_inclusions, load_inclusions, parse_inclusions};
pub use legacy::{
    LegacyEntry, LegacyFile, load_specification, parse_specification, split_terms,
    write_specification,
};
