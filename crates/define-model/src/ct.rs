//! Codelist model for Define-XML codelist worksheets.
//!
//! A [`Codelist`] here is the *emitted* codelist: an ordered list of terms
//! that a study actually uses, which is usually a subset of an authority
//! (CDISC CT) codelist, optionally extended with sponsor-defined terms.
//!
//! ## Term order
//!
//! Terms are stored in a `Vec` and their order number is always the
//! 1-based position in that vector. Order therefore stays contiguous no
//! matter how standard and non-standard terms are mixed.
//!
//! ## Term origin
//!
//! | origin         | term code | owning standard |
//! |----------------|-----------|-----------------|
//! | `Standard`     | required  | required        |
//! | `NonStandard`  | never     | never           |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, Oid};

/// Define-XML data type of a codelist or value-level item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Integer,
    Float,
    Datetime,
}

impl DataType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Datetime => "datetime",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl FromStr for DataType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "char" => Ok(Self::Text),
            "integer" | "num" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "datetime" => Ok(Self::Datetime),
            _ => Err(ModelError::InvalidDataType(s.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a term comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum TermOrigin {
    /// Sourced from the authority terminology.
    Standard {
        /// NCI concept code of the term (e.g. "C41259").
        term_code: String,
        /// OID of the standard that owns the term (e.g. "STD.2").
        standard_oid: String,
    },
    /// Declared locally by the specification.
    NonStandard,
}

/// A single term of an emitted codelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodelistTerm {
    pub submission_value: String,
    pub decoded_value: Option<String>,
    #[serde(flatten)]
    pub origin: TermOrigin,
}

impl CodelistTerm {
    pub fn standard(
        submission_value: impl Into<String>,
        term_code: impl Into<String>,
        decoded_value: Option<String>,
        standard_oid: impl Into<String>,
    ) -> Self {
        Self {
            submission_value: submission_value.into(),
            decoded_value,
            origin: TermOrigin::Standard {
                term_code: term_code.into(),
                standard_oid: standard_oid.into(),
            },
        }
    }

    /// A sponsor-defined term: no term code, no decoded value, no standard.
    pub fn non_standard(submission_value: impl Into<String>) -> Self {
        Self {
            submission_value: submission_value.into(),
            decoded_value: None,
            origin: TermOrigin::NonStandard,
        }
    }

    pub fn is_non_standard(&self) -> bool {
        matches!(self.origin, TermOrigin::NonStandard)
    }

    pub fn term_code(&self) -> Option<&str> {
        match &self.origin {
            TermOrigin::Standard { term_code, .. } => Some(term_code),
            TermOrigin::NonStandard => None,
        }
    }

    pub fn standard_oid(&self) -> Option<&str> {
        match &self.origin {
            TermOrigin::Standard { standard_oid, .. } => Some(standard_oid),
            TermOrigin::NonStandard => None,
        }
    }
}

/// An emitted codelist with ordered, uniquely valued terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelist {
    pub oid: Oid,
    pub name: String,
    /// Authority concept code; absent for purely non-standard codelists.
    pub authority_code: Option<String>,
    pub data_type: DataType,
    /// Set when the codelist is known to be incomplete.
    pub comment: Option<String>,
    terms: Vec<CodelistTerm>,
}

impl Codelist {
    pub fn new(
        oid: Oid,
        name: impl Into<String>,
        authority_code: Option<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            oid,
            name: name.into(),
            authority_code,
            data_type,
            comment: None,
            terms: Vec::new(),
        }
    }

    /// Append a term. Returns `false` (and leaves the codelist untouched)
    /// when a term with the same submission value is already present.
    pub fn push_term(&mut self, term: CodelistTerm) -> bool {
        if self.contains(&term.submission_value) {
            return false;
        }
        self.terms.push(term);
        true
    }

    pub fn contains(&self, submission_value: &str) -> bool {
        self.terms
            .iter()
            .any(|term| term.submission_value == submission_value)
    }

    pub fn terms(&self) -> &[CodelistTerm] {
        &self.terms
    }

    /// Terms paired with their 1-based order number.
    pub fn ordered_terms(&self) -> impl Iterator<Item = (u32, &CodelistTerm)> + '_ {
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (idx as u32 + 1, term))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Character length of the longest submission value.
    pub fn max_value_length(&self) -> Option<usize> {
        self.terms
            .iter()
            .map(|term| term.submission_value.chars().count())
            .max()
    }

    pub fn has_standard_terms(&self) -> bool {
        self.terms.iter().any(|term| !term.is_non_standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Codelist {
        let mut codelist = Codelist::new(
            Oid::new("CL.SC.SCORRES.EDULEVEL"),
            "Codelist for SC SCORRES where EDULEVEL",
            None,
            DataType::Text,
        );
        codelist.push_term(CodelistTerm::standard(
            "COLLEGE",
            "C0001",
            Some("College".to_string()),
            "STD.2",
        ));
        codelist.push_term(CodelistTerm::non_standard("SOME HIGH SCHOOL"));
        codelist
    }

    #[test]
    fn order_is_position_based() {
        let codelist = sample();
        let orders: Vec<u32> = codelist.ordered_terms().map(|(order, _)| order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn duplicate_submission_values_are_rejected() {
        let mut codelist = sample();
        assert!(!codelist.push_term(CodelistTerm::non_standard("COLLEGE")));
        assert_eq!(codelist.len(), 2);
    }

    #[test]
    fn non_standard_terms_carry_no_authority_linkage() {
        let term = CodelistTerm::non_standard("CGM");
        assert!(term.is_non_standard());
        assert_eq!(term.term_code(), None);
        assert_eq!(term.standard_oid(), None);
        assert_eq!(term.decoded_value, None);
    }

    #[test]
    fn max_length_counts_characters() {
        let codelist = sample();
        assert_eq!(codelist.max_value_length(), Some("SOME HIGH SCHOOL".len()));
    }

    #[test]
    fn data_type_accepts_legacy_spellings() {
        assert_eq!("Num".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!(" TEXT ".parse::<DataType>().unwrap(), DataType::Text);
        assert!("decimal".parse::<DataType>().is_err());
    }
}
