//! Codelist subset building.
//!
//! A slot marked with an authority code takes the authority terms named by
//! its inclusion list (by submission value or concept code), in authority
//! order, followed by its local extension terms. A slot marked non-standard
//! takes its inclusion and extension values as local terms. Order numbers
//! are positional, so they stay contiguous whatever the provenance.

use define_model::{
    Codelist, CodelistTerm, Diagnostic, DiagnosticKind, Oid, StandardMarker, SubsetSlot,
    VariableKey,
};
use define_terminology::{AuthorityCodelist, AuthorityTerm, ResolutionFailure, TerminologyResolver};
use tracing::debug;

/// A subset codelist and what was found while building it.
#[derive(Debug, Clone)]
pub struct BuiltSubset {
    pub codelist: Codelist,
    /// Declared values with no match in the authority codelist.
    pub unmatched: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuiltSubset {
    pub fn is_incomplete(&self) -> bool {
        !self.unmatched.is_empty()
    }
}

/// Authority terms picked by an inclusion list.
#[derive(Debug)]
pub struct Selection<'a> {
    /// Matched terms in authority order.
    pub terms: Vec<&'a AuthorityTerm>,
    pub unmatched: Vec<String>,
}

/// Pick the authority terms named by `inclusions`. An empty inclusion list
/// selects the whole codelist.
pub fn select_terms<'a>(authority: &'a AuthorityCodelist, inclusions: &[String]) -> Selection<'a> {
    if inclusions.is_empty() {
        return Selection {
            terms: authority.terms.iter().collect(),
            unmatched: Vec::new(),
        };
    }
    let terms = authority
        .terms
        .iter()
        .filter(|term| inclusions.iter().any(|value| term.matches(value)))
        .collect();
    let unmatched = inclusions
        .iter()
        .filter(|value| !authority.terms.iter().any(|term| term.matches(value)))
        .cloned()
        .collect();
    Selection { terms, unmatched }
}

pub struct SubsetBuilder<'a, R: ?Sized> {
    resolver: &'a R,
    package: &'a str,
    standard_oid: &'a str,
}

impl<'a, R: TerminologyResolver + ?Sized> SubsetBuilder<'a, R> {
    pub fn new(resolver: &'a R, package: &'a str, standard_oid: &'a str) -> Self {
        Self {
            resolver,
            package,
            standard_oid,
        }
    }

    /// Build the codelist of one slot. `Ok(None)` when the slot has no
    /// codelist; the authority is only consulted for authority-marked slots.
    pub fn build(
        &self,
        key: &VariableKey,
        slot: &SubsetSlot<'_>,
        oid: Oid,
        name: String,
    ) -> Result<Option<BuiltSubset>, ResolutionFailure> {
        let mut diagnostics = Vec::new();
        let inclusions = dedupe_declared(key, slot, slot.inclusions, &mut diagnostics);
        match slot.marker {
            StandardMarker::NoCodelist => Ok(None),
            StandardMarker::NonStandard => {
                let mut codelist = Codelist::new(oid, name, None, slot.data_type);
                for value in &inclusions {
                    codelist.push_term(CodelistTerm::non_standard(value.as_str()));
                }
                self.extend(key, slot, &mut codelist, &mut diagnostics);
                Ok(Some(BuiltSubset {
                    codelist,
                    unmatched: Vec::new(),
                    diagnostics,
                }))
            }
            StandardMarker::Authority(code) => {
                let authority = self.resolver.resolve(self.package, code)?;
                let selection = select_terms(&authority, &inclusions);
                debug!(
                    variable = %key,
                    codelist = %code,
                    matched = selection.terms.len(),
                    available = authority.terms.len(),
                    "selected authority terms"
                );

                let mut codelist =
                    Codelist::new(oid, name, Some(authority.concept_code.clone()), slot.data_type);
                for term in &selection.terms {
                    codelist.push_term(CodelistTerm::standard(
                        term.submission_value.as_str(),
                        term.concept_code.as_str(),
                        term.preferred_term.clone(),
                        self.standard_oid,
                    ));
                }

                for value in &selection.unmatched {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::SpecificationMismatch,
                            format!(
                                "declared term '{value}' is not in codelist {code} ({})",
                                authority.name
                            ),
                        )
                        .for_variable(key)
                        .at_slot(slot.index)
                        .with_codelist(code.as_str()),
                    );
                }
                if selection.terms.is_empty() {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::EmptySubset,
                            format!(
                                "none of the {} declared terms are in codelist {code}",
                                inclusions.len()
                            ),
                        )
                        .for_variable(key)
                        .at_slot(slot.index)
                        .with_codelist(code.as_str()),
                    );
                }
                if !selection.unmatched.is_empty() {
                    codelist.comment = Some(format!(
                        "Incomplete subset: {} not found in {code}",
                        selection.unmatched.join(", ")
                    ));
                }

                self.extend(key, slot, &mut codelist, &mut diagnostics);
                Ok(Some(BuiltSubset {
                    codelist,
                    unmatched: selection.unmatched,
                    diagnostics,
                }))
            }
        }
    }

    /// Append the slot's local extension terms.
    fn extend(
        &self,
        key: &VariableKey,
        slot: &SubsetSlot<'_>,
        codelist: &mut Codelist,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for value in slot.extensions.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            if !codelist.push_term(CodelistTerm::non_standard(value)) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::DuplicateTerm,
                        format!("term '{value}' is already in {}", codelist.oid),
                    )
                    .for_variable(key)
                    .at_slot(slot.index),
                );
            }
        }
    }
}

/// Trim declared values, dropping blanks and reporting repeats.
fn dedupe_declared(
    key: &VariableKey,
    slot: &SubsetSlot<'_>,
    values: &[String],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if unique.iter().any(|seen| seen == value) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::DuplicateTerm,
                    format!("term '{value}' is declared more than once"),
                )
                .for_variable(key)
                .at_slot(slot.index),
            );
        } else {
            unique.push(value.to_string());
        }
    }
    unique
}
