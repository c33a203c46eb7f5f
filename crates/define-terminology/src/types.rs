use serde::{Deserialize, Serialize};

/// A term as published by the authority terminology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityTerm {
    /// NCI concept code (e.g. "C20197").
    pub concept_code: String,
    /// Permissible dataset value (e.g. "M").
    pub submission_value: String,
    /// NCI preferred term (e.g. "Male").
    pub preferred_term: Option<String>,
}

impl AuthorityTerm {
    /// Whether `value` names this term, by exact submission value or
    /// (case-insensitively) by concept code.
    pub fn matches(&self, value: &str) -> bool {
        self.submission_value == value || self.concept_code.eq_ignore_ascii_case(value)
    }
}

/// A full codelist as published by the authority, terms in published order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityCodelist {
    /// NCI concept code of the codelist (e.g. "C66731").
    pub concept_code: String,
    /// Human-readable name (e.g. "Sex").
    pub name: String,
    /// Codelist short name (e.g. "SEX").
    pub submission_value: Option<String>,
    pub extensible: bool,
    pub terms: Vec<AuthorityTerm>,
}

impl AuthorityCodelist {
    pub fn new(concept_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            concept_code: concept_code.into(),
            name: name.into(),
            submission_value: None,
            extensible: false,
            terms: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_term(
        mut self,
        concept_code: impl Into<String>,
        submission_value: impl Into<String>,
        preferred_term: Option<&str>,
    ) -> Self {
        self.terms.push(AuthorityTerm {
            concept_code: concept_code.into(),
            submission_value: submission_value.into(),
            preferred_term: preferred_term.map(str::to_string),
        });
        self
    }

    /// Find a term by exact submission value.
    pub fn term_by_value(&self, submission_value: &str) -> Option<&AuthorityTerm> {
        self.terms
            .iter()
            .find(|term| term.submission_value == submission_value)
    }
}
