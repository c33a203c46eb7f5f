//! Whole-run checks applied before output is handed to a sink.

use std::collections::{HashMap, HashSet};

use define_model::Oid;

use crate::engine::DerivationOutput;
use crate::error::DerivationError;

/// Codelist, where-clause and item OIDs must be unique across the run.
pub fn check_unique_oids(output: &DerivationOutput) -> Result<(), DerivationError> {
    let mut seen: HashMap<&Oid, &'static str> = HashMap::new();
    let emitted = output
        .codelists
        .iter()
        .map(|c| (&c.oid, "codelist"))
        .chain(output.where_clauses.iter().map(|w| (&w.oid, "where clause")))
        .chain(output.value_level.iter().map(|v| (&v.item_oid, "value-level item")));
    for (oid, kind) in emitted {
        if let Some(first) = seen.insert(oid, kind) {
            return Err(DerivationError::DuplicateOid {
                oid: oid.clone(),
                first,
                second: kind,
            });
        }
    }
    Ok(())
}

/// Every value-level entry must reference a where clause and (when present)
/// a codelist emitted in the same run.
pub fn check_references(output: &DerivationOutput) -> Result<(), DerivationError> {
    let where_clauses: HashSet<&Oid> = output.where_clauses.iter().map(|w| &w.oid).collect();
    let codelists: HashSet<&Oid> = output.codelists.iter().map(|c| &c.oid).collect();
    for entry in &output.value_level {
        let targets = std::iter::once((&entry.where_clause, &where_clauses))
            .chain(entry.codelist.iter().map(|oid| (oid, &codelists)));
        for (target, emitted) in targets {
            if !emitted.contains(target) {
                return Err(DerivationError::DanglingReference {
                    from: entry.item_oid.clone(),
                    to: target.clone(),
                });
            }
        }
    }
    Ok(())
}

pub fn check_output(output: &DerivationOutput) -> Result<(), DerivationError> {
    check_unique_oids(output)?;
    check_references(output)
}
