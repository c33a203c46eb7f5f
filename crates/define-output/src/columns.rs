//! Column registries of the three worksheets.
//!
//! Each worksheet has a fixed column set, declared as an enum whose
//! variants are listed in output order by [`Column::ALL`]. A column maps to
//! its header and to a pure cell function over one record; there is no
//! lookup by name at run time. The header spellings and order are consumed
//! verbatim by the downstream metadata-authoring tool.

use define_model::{Codelist, CodelistTerm, Condition, ValueLevelMetadata, WhereClause};

/// Separator between the OR-ed values of one condition.
pub const VALUE_SEPARATOR: &str = "|";

/// One column of a worksheet.
pub trait Column: Copy + 'static {
    /// What one row of the worksheet is rendered from.
    type Record<'a>;

    /// Every column, in output order.
    const ALL: &'static [Self];

    fn header(self) -> &'static str;

    fn cell(self, record: &Self::Record<'_>) -> String;
}

/// Headers of a worksheet, in output order.
pub fn headers<C: Column>() -> Vec<&'static str> {
    C::ALL.iter().map(|column| column.header()).collect()
}

/// Render one record into cells, in output order.
pub fn render<C: Column>(record: &C::Record<'_>) -> Vec<String> {
    C::ALL.iter().map(|column| column.cell(record)).collect()
}

fn flag(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

// ============================================================================
// Codelists
// ============================================================================

/// One term of one codelist.
#[derive(Debug, Clone, Copy)]
pub struct TermRecord<'a> {
    pub codelist: &'a Codelist,
    pub order: u32,
    pub term: &'a CodelistTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodelistColumn {
    Oid,
    Name,
    CodelistCode,
    DataType,
    Order,
    Term,
    TermCode,
    DecodedValue,
    Comment,
    IsNonStandard,
    StandardOid,
}

impl Column for CodelistColumn {
    type Record<'a> = TermRecord<'a>;

    const ALL: &'static [Self] = &[
        Self::Oid,
        Self::Name,
        Self::CodelistCode,
        Self::DataType,
        Self::Order,
        Self::Term,
        Self::TermCode,
        Self::DecodedValue,
        Self::Comment,
        Self::IsNonStandard,
        Self::StandardOid,
    ];

    fn header(self) -> &'static str {
        match self {
            Self::Oid => "OID",
            Self::Name => "Name",
            Self::CodelistCode => "NCI Codelist Code",
            Self::DataType => "Data Type",
            Self::Order => "Order",
            Self::Term => "Term",
            Self::TermCode => "NCI Term Code",
            Self::DecodedValue => "Decoded Value",
            Self::Comment => "Comment",
            Self::IsNonStandard => "IsNonStandard",
            Self::StandardOid => "StandardOID",
        }
    }

    fn cell(self, record: &TermRecord<'_>) -> String {
        let TermRecord {
            codelist,
            order,
            term,
        } = *record;
        match self {
            Self::Oid => codelist.oid.to_string(),
            Self::Name => codelist.name.clone(),
            Self::CodelistCode => optional(codelist.authority_code.as_deref()),
            Self::DataType => codelist.data_type.to_string(),
            Self::Order => order.to_string(),
            Self::Term => term.submission_value.clone(),
            Self::TermCode => optional(term.term_code()),
            Self::DecodedValue => optional(term.decoded_value.as_deref()),
            Self::Comment => optional(codelist.comment.as_deref()),
            // Only the non-standard side is flagged; standard terms stay blank.
            Self::IsNonStandard if term.is_non_standard() => flag(true),
            Self::IsNonStandard => String::new(),
            Self::StandardOid => optional(term.standard_oid()),
        }
    }
}

// ============================================================================
// Where clauses
// ============================================================================

/// One condition of one where clause.
#[derive(Debug, Clone, Copy)]
pub struct ConditionRecord<'a> {
    pub clause: &'a WhereClause,
    pub condition: &'a Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereClauseColumn {
    Oid,
    Dataset,
    Variable,
    Comparator,
    Value,
    Comment,
}

impl Column for WhereClauseColumn {
    type Record<'a> = ConditionRecord<'a>;

    const ALL: &'static [Self] = &[
        Self::Oid,
        Self::Dataset,
        Self::Variable,
        Self::Comparator,
        Self::Value,
        Self::Comment,
    ];

    fn header(self) -> &'static str {
        match self {
            Self::Oid => "OID",
            Self::Dataset => "Dataset",
            Self::Variable => "Variable",
            Self::Comparator => "Comparator",
            Self::Value => "Value",
            Self::Comment => "Comment",
        }
    }

    fn cell(self, record: &ConditionRecord<'_>) -> String {
        match self {
            Self::Oid => record.clause.oid.to_string(),
            Self::Dataset => record.clause.dataset.clone(),
            Self::Variable => record.condition.variable.clone(),
            Self::Comparator => record.condition.comparator.to_string(),
            Self::Value => record.condition.joined_values(VALUE_SEPARATOR),
            Self::Comment => String::new(),
        }
    }
}

// ============================================================================
// Value-level metadata
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueLevelColumn {
    Oid,
    Order,
    Dataset,
    Variable,
    ItemOid,
    WhereClause,
    DataType,
    Length,
    SignificantDigits,
    Format,
    Mandatory,
    Codelist,
    Comment,
}

impl Column for ValueLevelColumn {
    type Record<'a> = &'a ValueLevelMetadata;

    const ALL: &'static [Self] = &[
        Self::Oid,
        Self::Order,
        Self::Dataset,
        Self::Variable,
        Self::ItemOid,
        Self::WhereClause,
        Self::DataType,
        Self::Length,
        Self::SignificantDigits,
        Self::Format,
        Self::Mandatory,
        Self::Codelist,
        Self::Comment,
    ];

    fn header(self) -> &'static str {
        match self {
            Self::Oid => "OID",
            Self::Order => "Order",
            Self::Dataset => "Dataset",
            Self::Variable => "Variable",
            Self::ItemOid => "ItemOID",
            Self::WhereClause => "Where Clause",
            Self::DataType => "Data Type",
            Self::Length => "Length",
            Self::SignificantDigits => "Significant Digits",
            Self::Format => "Format",
            Self::Mandatory => "Mandatory",
            Self::Codelist => "Codelist",
            Self::Comment => "Comment",
        }
    }

    fn cell(self, record: &&ValueLevelMetadata) -> String {
        let vlm = *record;
        match self {
            Self::Oid => vlm.oid.to_string(),
            Self::Order => vlm.order.to_string(),
            Self::Dataset => vlm.dataset.clone(),
            Self::Variable => vlm.variable.clone(),
            Self::ItemOid => vlm.item_oid.to_string(),
            Self::WhereClause => vlm.where_clause.to_string(),
            Self::DataType => vlm.data_type.to_string(),
            Self::Length => optional(vlm.length),
            Self::SignificantDigits => optional(vlm.significant_digits),
            Self::Format => optional(vlm.display_format.as_deref()),
            Self::Mandatory => flag(vlm.mandatory),
            Self::Codelist => optional(vlm.codelist.as_ref()),
            Self::Comment => optional(vlm.comment.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use define_model::{Comparator, DataType, Oid};

    use super::*;

    #[test]
    fn header_order_is_fixed() {
        assert_eq!(
            headers::<CodelistColumn>(),
            [
                "OID",
                "Name",
                "NCI Codelist Code",
                "Data Type",
                "Order",
                "Term",
                "NCI Term Code",
                "Decoded Value",
                "Comment",
                "IsNonStandard",
                "StandardOID",
            ]
        );
        assert_eq!(
            headers::<WhereClauseColumn>(),
            ["OID", "Dataset", "Variable", "Comparator", "Value", "Comment"]
        );
        assert_eq!(headers::<ValueLevelColumn>().len(), 13);
        assert_eq!(headers::<ValueLevelColumn>()[5], "Where Clause");
    }

    #[test]
    fn non_standard_term_leaves_authority_cells_blank() {
        let codelist = Codelist::new(
            Oid::new("CL.FA.FAORRES.INSULIN"),
            "Codelist for FA FAORRES where INSULIN",
            None,
            DataType::Text,
        );
        let term = CodelistTerm::non_standard("PUMP");
        let cells = render::<CodelistColumn>(&TermRecord {
            codelist: &codelist,
            order: 1,
            term: &term,
        });
        assert_eq!(
            cells,
            [
                "CL.FA.FAORRES.INSULIN",
                "Codelist for FA FAORRES where INSULIN",
                "",
                "text",
                "1",
                "PUMP",
                "",
                "",
                "",
                "Yes",
                "",
            ]
        );
    }

    #[test]
    fn condition_values_are_pipe_joined() {
        let condition =
            Condition::new("FATESTCD", Comparator::In, ["INSULIN", "CGM"]).unwrap();
        let clause = WhereClause {
            oid: Oid::new("WC.FA.FAORRES.INSULIN"),
            dataset: "FA".to_string(),
            owner: "FAORRES".to_string(),
            conditions: vec![condition.clone()],
        };
        let cells = render::<WhereClauseColumn>(&ConditionRecord {
            clause: &clause,
            condition: &condition,
        });
        assert_eq!(
            cells,
            ["WC.FA.FAORRES.INSULIN", "FA", "FATESTCD", "IN", "INSULIN|CGM", ""]
        );
    }

    #[test]
    fn value_level_mandatory_renders_no() {
        let vlm = ValueLevelMetadata {
            oid: Oid::new("VL.FA.FAORRES"),
            order: 2,
            dataset: "FA".to_string(),
            variable: "FAORRES".to_string(),
            item_oid: Oid::new("IT.FA.FAORRES.AGE"),
            where_clause: Oid::new("WC.FA.FAORRES.AGE"),
            data_type: DataType::Float,
            length: Some(3),
            significant_digits: Some(2),
            display_format: Some("3.2".to_string()),
            mandatory: false,
            codelist: None,
            comment: None,
        };
        let cells = render::<ValueLevelColumn>(&&vlm);
        assert_eq!(cells[10], "No");
        assert_eq!(&cells[7..10], ["3", "2", "3.2"]);
        assert_eq!(cells[11], "");
    }
}
