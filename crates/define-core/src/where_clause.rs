use define_model::{Condition, VariableKey, WhereClause};

use crate::oid::{self, SlotToken};

/// Build the selector of one conditional subset.
///
/// The OID comes from `token`, which the caller computes once per variable
/// so that the codelist, item and selector of a slot share it.
pub fn build_where_clause(
    key: &VariableKey,
    conditions: &[Condition],
    token: &SlotToken,
) -> WhereClause {
    WhereClause {
        oid: oid::where_clause_oid(key, token),
        dataset: key.dataset().to_string(),
        owner: key.variable().to_string(),
        conditions: conditions.to_vec(),
    }
}

/// Build the selectors of every conditional subset of a variable, applying
/// the collision ordinals over the leading condition values.
///
/// Condition lists must be non-empty; an empty list yields no selector.
pub fn build_where_clauses(key: &VariableKey, condition_lists: &[Vec<Condition>]) -> Vec<WhereClause> {
    let lists: Vec<&[Condition]> = condition_lists
        .iter()
        .map(Vec::as_slice)
        .filter(|list| !list.is_empty())
        .collect();
    let tokens = oid::slot_tokens(
        lists
            .iter()
            .map(|list| list.first().map_or("", Condition::leading_value)),
    );
    lists
        .iter()
        .zip(&tokens)
        .map(|(conditions, token)| build_where_clause(key, conditions, token))
        .collect()
}
