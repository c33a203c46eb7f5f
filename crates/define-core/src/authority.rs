//! Codelists taken directly from the authority rather than from a
//! variable's subset declaration.

use std::collections::HashSet;

use define_model::{Codelist, CodelistTerm, DataType, Diagnostic, DiagnosticKind, Severity};
use define_terminology::{AuthorityCodelist, TerminologyResolver};
use tracing::debug;

use crate::engine::DerivationOptions;
use crate::oid;
use crate::subset::select_terms;

/// Every term of an authority codelist, in authority order, as `CL.<code>`.
pub fn full_codelist(authority: &AuthorityCodelist, standard_oid: &str) -> Codelist {
    let mut codelist = Codelist::new(
        oid::authority_codelist_oid(&authority.concept_code),
        authority.name.as_str(),
        Some(authority.concept_code.clone()),
        DataType::Text,
    );
    for term in &authority.terms {
        let added = codelist.push_term(CodelistTerm::standard(
            term.submission_value.as_str(),
            term.concept_code.as_str(),
            term.preferred_term.clone(),
            standard_oid,
        ));
        if !added {
            debug!(codelist = %codelist.oid, term = %term.submission_value, "skipping repeated authority term");
        }
    }
    codelist
}

/// The authority terms named by `values`, as `CL.<code>`, named after the
/// codelist's submission value. Terms keep authority order and are
/// numbered from 1. Returns the values that matched no term.
pub fn authority_subset(
    authority: &AuthorityCodelist,
    values: &[String],
    standard_oid: &str,
) -> (Codelist, Vec<String>) {
    let name = authority
        .submission_value
        .as_deref()
        .unwrap_or(authority.name.as_str());
    let mut codelist = Codelist::new(
        oid::authority_codelist_oid(&authority.concept_code),
        name,
        Some(authority.concept_code.clone()),
        DataType::Text,
    );
    let selection = select_terms(authority, values);
    for term in selection.terms {
        codelist.push_term(CodelistTerm::standard(
            term.submission_value.as_str(),
            term.concept_code.as_str(),
            term.preferred_term.clone(),
            standard_oid,
        ));
    }
    (codelist, selection.unmatched)
}

/// Drop repeated entries, comparing case-insensitively and keeping the
/// first spelling.
pub(crate) fn distinct_codes<'a, I>(what: &str, codes: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for code in codes {
        if seen.insert(code.to_ascii_uppercase()) {
            distinct.push(code.as_str());
        } else {
            debug!(entry = %code, list = what, "ignoring repeated configuration entry");
        }
    }
    distinct
}

/// One-term codelist `CL.DOMAIN.<dataset>` holding the dataset's domain
/// abbreviation. Falls back to a non-standard term when the authority
/// codelist is unavailable or lacks the abbreviation.
pub fn domain_codelist(
    dataset: &str,
    domain_code: &str,
    authority: Option<&AuthorityCodelist>,
    standard_oid: &str,
) -> Codelist {
    let mut codelist = Codelist::new(
        oid::domain_codelist_oid(dataset),
        format!("Domain Abbreviation ({dataset})"),
        Some(domain_code.to_string()),
        DataType::Text,
    );
    let term = match authority.and_then(|cl| cl.term_by_value(dataset)) {
        Some(term) => CodelistTerm::standard(
            term.submission_value.as_str(),
            term.concept_code.as_str(),
            term.preferred_term.clone(),
            standard_oid,
        ),
        None => CodelistTerm::non_standard(dataset),
    };
    codelist.push_term(term);
    codelist
}

/// Full, subset and domain-abbreviation codelists requested by `options`.
///
/// Repeated codes or datasets in the configuration are emitted once. A
/// code requested both in full and as a subset is emitted in full.
pub fn supplementary_codelists<R: TerminologyResolver + ?Sized>(
    resolver: &R,
    options: &DerivationOptions,
) -> (Vec<Codelist>, Vec<Diagnostic>) {
    let mut codelists = Vec::new();
    let mut diagnostics = Vec::new();

    let full = distinct_codes("full", &options.full_codelists);
    for code in &full {
        match resolver.resolve(&options.package, code) {
            Ok(authority) => codelists.push(full_codelist(&authority, &options.standard_oid)),
            Err(failure) => diagnostics.push(
                Diagnostic::new(DiagnosticKind::ResolutionFailure, failure.to_string())
                    .with_codelist(*code),
            ),
        }
    }

    let mut subset_codes = HashSet::new();
    for (code, values) in &options.codelist_subsets {
        if !subset_codes.insert(code.to_ascii_uppercase()) {
            debug!(entry = %code, list = "subsets", "ignoring repeated configuration entry");
            continue;
        }
        if full.iter().any(|full_code| full_code.eq_ignore_ascii_case(code)) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::IgnoredCodelist,
                    format!("subset of codelist {code} ignored; the codelist is emitted in full"),
                )
                .with_codelist(code.as_str()),
            );
            continue;
        }
        let authority = match resolver.resolve(&options.package, code) {
            Ok(authority) => authority,
            Err(failure) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::ResolutionFailure, failure.to_string())
                        .with_codelist(code.as_str()),
                );
                continue;
            }
        };
        let (codelist, unmatched) = authority_subset(&authority, values, &options.standard_oid);
        for value in &unmatched {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::SpecificationMismatch,
                    format!(
                        "declared term '{value}' is not in codelist {code} ({})",
                        authority.name
                    ),
                )
                .with_codelist(code.as_str()),
            );
        }
        if codelist.is_empty() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::EmptySubset,
                    format!("none of the {} declared terms are in codelist {code}", values.len()),
                )
                .with_codelist(code.as_str()),
            );
        } else {
            codelists.push(codelist);
        }
    }

    let domains = distinct_codes("domains", &options.domains);
    if !domains.is_empty() {
        let authority = match resolver.resolve(&options.package, &options.domain_codelist) {
            Ok(authority) => Some(authority),
            Err(failure) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::ResolutionFailure,
                        format!("{failure}; domain abbreviations emitted as non-standard terms"),
                    )
                    .with_severity(Severity::Warning)
                    .with_codelist(options.domain_codelist.as_str()),
                );
                None
            }
        };
        for dataset in domains {
            codelists.push(domain_codelist(
                dataset,
                &options.domain_codelist,
                authority.as_deref(),
                &options.standard_oid,
            ));
        }
    }

    (codelists, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> AuthorityCodelist {
        AuthorityCodelist::new("C66734", "SDTM Domain Abbreviation")
            .with_term("C49559", "DM", Some("Demographics Domain"))
            .with_term("C49622", "VS", Some("Vital Signs Domain"))
    }

    #[test]
    fn known_domain_is_standard() {
        let codelist = domain_codelist("VS", "C66734", Some(&domains()), "STD.2");
        assert_eq!(codelist.oid.as_str(), "CL.DOMAIN.VS");
        assert_eq!(codelist.name, "Domain Abbreviation (VS)");
        let term = &codelist.terms()[0];
        assert_eq!(term.term_code(), Some("C49622"));
        assert_eq!(term.decoded_value.as_deref(), Some("Vital Signs Domain"));
        assert_eq!(term.standard_oid(), Some("STD.2"));
    }

    #[test]
    fn unknown_domain_is_non_standard() {
        let codelist = domain_codelist("FACM", "C66734", Some(&domains()), "STD.2");
        let term = &codelist.terms()[0];
        assert!(term.is_non_standard());
        assert_eq!(term.submission_value, "FACM");
        assert_eq!(codelist.authority_code.as_deref(), Some("C66734"));
    }

    #[test]
    fn full_codelist_keeps_every_term() {
        let codelist = full_codelist(&domains(), "STD.2");
        assert_eq!(codelist.oid.as_str(), "CL.C66734");
        assert_eq!(codelist.name, "SDTM Domain Abbreviation");
        let orders: Vec<u32> = codelist.ordered_terms().map(|(order, _)| order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn subset_is_renumbered_in_authority_order() {
        let mut tests = AuthorityCodelist::new("C65047", "Laboratory Test Code")
            .with_term("C64848", "ALB", Some("Albumin"))
            .with_term("C64849", "ALP", Some("Alkaline Phosphatase"))
            .with_term("C64796", "HBA1C", Some("Hemoglobin A1C"));
        tests.submission_value = Some("LBTESTCD".to_string());

        let values = vec!["HBA1C".to_string(), "c64848".to_string(), "GLUC".to_string()];
        let (codelist, unmatched) = authority_subset(&tests, &values, "STD.1");
        assert_eq!(codelist.oid.as_str(), "CL.C65047");
        assert_eq!(codelist.name, "LBTESTCD");
        let picked: Vec<(u32, &str)> = codelist
            .ordered_terms()
            .map(|(order, term)| (order, term.submission_value.as_str()))
            .collect();
        assert_eq!(picked, vec![(1, "ALB"), (2, "HBA1C")]);
        assert_eq!(unmatched, vec!["GLUC"]);
    }

    #[test]
    fn repeated_codes_are_kept_once() {
        let codes = vec!["C66731".to_string(), "c66731".to_string(), "C66742".to_string()];
        assert_eq!(distinct_codes("full", &codes), vec!["C66731", "C66742"]);
    }
}
