//! Derivation of Define-XML codelists, where clauses and value-level
//! metadata from a subset specification.

pub mod authority;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod oid;
pub mod subset;
pub mod vlm;
pub mod where_clause;

pub use authority::{authority_subset, domain_codelist, full_codelist, supplementary_codelists};
pub use consistency::{check_output, check_references, check_unique_oids};
pub use engine::{
    DEFAULT_PACKAGE, DEFAULT_STANDARD_OID, DOMAIN_ABBREVIATION_CODELIST, DerivationOptions,
    DerivationOutput, DerivationStats, derive,
};
pub use error::DerivationError;
pub use oid::{OidKind, SlotToken, build_oid, name_to_token, slot_tokens};
pub use subset::{BuiltSubset, Selection, SubsetBuilder, select_terms};
pub use vlm::{Shape, build_value_level, infer_shape};
pub use where_clause::{build_where_clause, build_where_clauses};
