use define_model::Oid;
use thiserror::Error;

/// Consistency violations that make a run's output unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("duplicate OID {oid}: emitted as {first} and as {second}")]
    DuplicateOid {
        oid: Oid,
        first: &'static str,
        second: &'static str,
    },

    #[error("{from} references {to}, which was not emitted")]
    DanglingReference { from: Oid, to: Oid },
}
