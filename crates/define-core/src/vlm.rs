//! Value-level metadata synthesis and data-shape inference.

use define_model::{
    Codelist, DataType, Diagnostic, DiagnosticKind, Oid, SubsetSlot, ValueLevelMetadata,
    VariableKey, WhereClause,
};

/// Length used for numeric entries without a declared length.
pub const DEFAULT_NUMBER_LENGTH: u32 = 3;

/// Significant digits used for fractional entries without a declared value.
pub const DEFAULT_SIGNIFICANT_DIGITS: u32 = 2;

/// Comment on a text entry whose length could not be derived.
pub const MISSING_TERMS_NOTICE: &str = "No codelist terms attached; length not derived";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub length: Option<u32>,
    pub significant_digits: Option<u32>,
    pub display_format: Option<String>,
}

/// Infer length, significant digits and format for one entry.
///
/// Text entries are as long as their longest codelist term, falling back to
/// the declared length. Returns `length: None` for text without either.
pub fn infer_shape(
    data_type: DataType,
    declared_length: Option<u32>,
    declared_significant_digits: Option<u32>,
    codelist: Option<&Codelist>,
) -> Shape {
    match data_type {
        DataType::Text => Shape {
            length: codelist
                .and_then(Codelist::max_value_length)
                .and_then(|len| u32::try_from(len).ok())
                .or(declared_length),
            significant_digits: None,
            display_format: None,
        },
        DataType::Integer => Shape {
            length: Some(declared_length.unwrap_or(DEFAULT_NUMBER_LENGTH)),
            significant_digits: None,
            display_format: None,
        },
        DataType::Float => {
            let length = declared_length.unwrap_or(DEFAULT_NUMBER_LENGTH);
            let digits = declared_significant_digits.unwrap_or(DEFAULT_SIGNIFICANT_DIGITS);
            Shape {
                length: Some(length),
                significant_digits: Some(digits),
                display_format: Some(format!("{length}.{digits}")),
            }
        }
        DataType::Datetime => Shape {
            length: declared_length,
            significant_digits: None,
            display_format: None,
        },
    }
}

/// Everything already built for one conditional subset.
#[derive(Debug, Clone, Copy)]
pub struct SlotParts<'a> {
    pub slot: SubsetSlot<'a>,
    pub where_clause: &'a WhereClause,
    pub item_oid: &'a Oid,
    /// The emitted codelist of the slot, if any.
    pub codelist: Option<&'a Codelist>,
}

/// Build the value-level entries of one variable, in slot order.
///
/// The selector is taken by reference from the parts rather than rebuilt,
/// so entry and selector always agree on the OID. Mandatory is always
/// `false`: it cannot be derived from the subset specification.
pub fn build_value_level(
    key: &VariableKey,
    value_list: &Oid,
    parts: &[SlotParts<'_>],
) -> (Vec<ValueLevelMetadata>, Vec<Diagnostic>) {
    let mut entries = Vec::with_capacity(parts.len());
    let mut diagnostics = Vec::new();

    for part in parts {
        let slot = &part.slot;
        let codelist = match (slot.data_type, part.codelist) {
            (DataType::Text, codelist) => codelist,
            (_, Some(codelist)) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::IgnoredCodelist,
                        format!(
                            "{} is not referenced: value-level type is {}",
                            codelist.oid, slot.data_type
                        ),
                    )
                    .for_variable(key)
                    .at_slot(slot.index),
                );
                None
            }
            (_, None) => None,
        };

        let shape = infer_shape(slot.data_type, slot.length, slot.significant_digits, codelist);
        let mut comment = codelist.and_then(|c| c.comment.clone());
        if slot.data_type == DataType::Text && shape.length.is_none() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MissingTerms,
                    format!(
                        "text entry {} has no codelist terms and no declared length",
                        part.item_oid
                    ),
                )
                .for_variable(key)
                .at_slot(slot.index),
            );
            comment = Some(MISSING_TERMS_NOTICE.to_string());
        }

        entries.push(ValueLevelMetadata {
            oid: value_list.clone(),
            order: u32::try_from(slot.index + 1).unwrap_or(u32::MAX),
            dataset: key.dataset().to_string(),
            variable: key.variable().to_string(),
            item_oid: part.item_oid.clone(),
            where_clause: part.where_clause.oid.clone(),
            data_type: slot.data_type,
            length: shape.length,
            significant_digits: shape.significant_digits,
            display_format: shape.display_format,
            mandatory: false,
            codelist: codelist.map(|c| c.oid.clone()),
            comment,
        });
    }

    (entries, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::CodelistTerm;

    #[test]
    fn numeric_defaults() {
        let shape = infer_shape(DataType::Float, None, None, None);
        assert_eq!(shape.length, Some(3));
        assert_eq!(shape.significant_digits, Some(2));
        assert_eq!(shape.display_format.as_deref(), Some("3.2"));

        let shape = infer_shape(DataType::Integer, None, Some(4), None);
        assert_eq!(shape.length, Some(3));
        assert_eq!(shape.significant_digits, None);
        assert_eq!(shape.display_format, None);
    }

    #[test]
    fn declared_values_win_for_numbers() {
        let shape = infer_shape(DataType::Float, Some(8), Some(3), None);
        assert_eq!(shape.display_format.as_deref(), Some("8.3"));
    }

    #[test]
    fn text_length_is_longest_term() {
        let mut codelist = Codelist::new(Oid::new("CL.X"), "X", None, DataType::Text);
        codelist.push_term(CodelistTerm::non_standard("Y"));
        codelist.push_term(CodelistTerm::non_standard("MULTIPLE"));
        let shape = infer_shape(DataType::Text, Some(200), None, Some(&codelist));
        assert_eq!(shape.length, Some(8));
        assert_eq!(infer_shape(DataType::Text, None, None, None).length, None);
    }

    #[test]
    fn datetime_uses_declared_length_only() {
        assert_eq!(infer_shape(DataType::Datetime, None, None, None).length, None);
        assert_eq!(
            infer_shape(DataType::Datetime, Some(19), Some(2), None),
            Shape {
                length: Some(19),
                significant_digits: None,
                display_format: None,
            }
        );
    }
}
