//! Worksheets built from a derivation output.

use define_core::DerivationOutput;
use define_model::{Codelist, ValueLevelMetadata, WhereClause};

use crate::columns::{
    CodelistColumn, Column, ConditionRecord, TermRecord, ValueLevelColumn, WhereClauseColumn,
    headers, render,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Codelists,
    WhereClauses,
    ValueLevel,
}

impl SheetKind {
    pub const ALL: [Self; 3] = [Self::Codelists, Self::WhereClauses, Self::ValueLevel];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Codelists => "codelists",
            Self::WhereClauses => "whereclauses",
            Self::ValueLevel => "valuelevel",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }
}

/// A rendered worksheet: fixed headers plus one row of cells per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub kind: SheetKind,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new<C: Column>(kind: SheetKind) -> Self {
        Self {
            kind,
            headers: headers::<C>(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row per term, codelists in emission order.
pub fn codelist_sheet(codelists: &[Codelist]) -> Sheet {
    let mut sheet = Sheet::new::<CodelistColumn>(SheetKind::Codelists);
    for codelist in codelists {
        for (order, term) in codelist.ordered_terms() {
            let record = TermRecord {
                codelist,
                order,
                term,
            };
            sheet.rows.push(render::<CodelistColumn>(&record));
        }
    }
    sheet
}

/// One row per condition; a where clause with AND-ed conditions spans
/// several consecutive rows sharing its OID.
pub fn where_clause_sheet(where_clauses: &[WhereClause]) -> Sheet {
    let mut sheet = Sheet::new::<WhereClauseColumn>(SheetKind::WhereClauses);
    for clause in where_clauses {
        for condition in &clause.conditions {
            let record = ConditionRecord { clause, condition };
            sheet.rows.push(render::<WhereClauseColumn>(&record));
        }
    }
    sheet
}

pub fn value_level_sheet(value_level: &[ValueLevelMetadata]) -> Sheet {
    let mut sheet = Sheet::new::<ValueLevelColumn>(SheetKind::ValueLevel);
    sheet.rows = value_level
        .iter()
        .map(|vlm| render::<ValueLevelColumn>(&vlm))
        .collect();
    sheet
}

/// All three worksheets, in [`SheetKind::ALL`] order.
pub fn build_sheets(output: &DerivationOutput) -> [Sheet; 3] {
    [
        codelist_sheet(&output.codelists),
        where_clause_sheet(&output.where_clauses),
        value_level_sheet(&output.value_level),
    ]
}

#[cfg(test)]
mod tests {
    use define_model::{CodelistTerm, Comparator, Condition, DataType, Oid};

    use super::*;

    #[test]
    fn and_combined_where_clause_spans_rows() {
        let clause = WhereClause {
            oid: Oid::new("WC.QS.QSORRES.IPAQ"),
            dataset: "QS".to_string(),
            owner: "QSORRES".to_string(),
            conditions: vec![
                Condition::new("QSCAT", Comparator::Eq, ["IPAQ"]).unwrap(),
                Condition::new("QSTESTCD", Comparator::In, ["IPA0401", "IPA0402"]).unwrap(),
            ],
        };
        let sheet = where_clause_sheet(std::slice::from_ref(&clause));
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows[0][0], sheet.rows[1][0]);
        assert_eq!(sheet.rows[1][4], "IPA0401|IPA0402");
    }

    #[test]
    fn codelist_rows_number_terms_contiguously() {
        let mut codelist = Codelist::new(
            Oid::new("CL.SC.SCORRES.EDULEVEL"),
            "Codelist for SC SCORRES where EDULEVEL",
            Some("C66790".to_string()),
            DataType::Text,
        );
        codelist.push_term(CodelistTerm::standard("COLLEGE", "C1", None, "STD.2"));
        codelist.push_term(CodelistTerm::non_standard("TRADE SCHOOL"));
        let sheet = codelist_sheet(&[codelist]);
        let orders: Vec<&str> = sheet.rows.iter().map(|row| row[4].as_str()).collect();
        assert_eq!(orders, ["1", "2"]);
        assert_eq!(SheetKind::Codelists.file_name(), "codelists.csv");
    }
}
