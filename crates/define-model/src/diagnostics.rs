use std::fmt;

use serde::{Deserialize, Serialize};

use crate::VariableKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Recoverable problems found while deriving one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The authority codelist could not be fetched.
    ResolutionFailure,
    /// A declared inclusion value is not in the authority codelist.
    SpecificationMismatch,
    /// An authority subset matched no terms at all.
    EmptySubset,
    /// Per-condition lists of a variable differ in length.
    MisalignedSpecification,
    /// A term was declared twice for the same codelist.
    DuplicateTerm,
    /// A text value-level entry has no codelist terms to size it.
    MissingTerms,
    /// A codelist was declared for a slot that cannot reference one.
    IgnoredCodelist,
}

impl DiagnosticKind {
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::ResolutionFailure | Self::MisalignedSpecification | Self::EmptySubset => {
                Severity::Error
            }
            Self::SpecificationMismatch
            | Self::DuplicateTerm
            | Self::MissingTerms
            | Self::IgnoredCodelist => Severity::Warning,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolutionFailure => "resolution_failure",
            Self::SpecificationMismatch => "specification_mismatch",
            Self::EmptySubset => "empty_subset",
            Self::MisalignedSpecification => "misaligned_specification",
            Self::DuplicateTerm => "duplicate_term",
            Self::MissingTerms => "missing_terms",
            Self::IgnoredCodelist => "ignored_codelist",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Variable the diagnostic belongs to, if any.
    pub variable: Option<VariableKey>,
    /// 1-based conditional subset number.
    pub condition: Option<usize>,
    /// Authority codelist code involved.
    pub codelist_code: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            variable: None,
            condition: None,
            codelist_code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn for_variable(mut self, key: &VariableKey) -> Self {
        self.variable = Some(key.clone());
        self
    }

    /// Attach the 0-based slot index (stored 1-based).
    #[must_use]
    pub fn at_slot(mut self, index: usize) -> Self {
        self.condition = Some(index + 1);
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_codelist(mut self, code: impl Into<String>) -> Self {
        self.codelist_code = Some(code.into());
        self
    }
}

/// Itemized diagnostics of one derivation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn for_variable<'a>(
        &'a self,
        key: &'a VariableKey,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.variable.as_ref() == Some(key))
    }
}
