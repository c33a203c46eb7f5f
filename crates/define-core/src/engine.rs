//! One derivation pass over a subset specification.
//!
//! Authority codelists are prefetched concurrently into a run-scoped cache,
//! then every variable is derived in declaration order. A variable that
//! cannot be derived contributes diagnostics but no rows; the remaining
//! variables are unaffected. The finished output is checked for OID
//! uniqueness and dangling references before it is returned.

use std::time::Instant;

use define_model::{
    Codelist, Condition, Diagnostic, DiagnosticKind, DiagnosticReport, Oid, StandardMarker,
    SubsetSpecification, ValueLevelMetadata, VariableSubsetSpec, WhereClause,
};
use define_terminology::{CachingResolver, CodelistKey, TerminologyResolver, prefetch};
use tracing::{debug, info, info_span, warn};

use crate::authority;
use crate::consistency;
use crate::error::DerivationError;
use crate::oid::{self, SlotToken};
use crate::subset::SubsetBuilder;
use crate::vlm::{SlotParts, build_value_level};
use crate::where_clause::build_where_clause;

/// CT package used when none is configured.
pub const DEFAULT_PACKAGE: &str = "sdtmct-2021-12-17";

/// Standard OID recorded on authority-sourced terms by default.
pub const DEFAULT_STANDARD_OID: &str = "STD.2";

/// Authority codelist of SDTM domain abbreviations.
pub const DOMAIN_ABBREVIATION_CODELIST: &str = "C66734";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationOptions {
    /// Terminology package all authority lookups are made against.
    pub package: String,
    pub standard_oid: String,
    /// Authority codelists emitted in full as `CL.<code>`.
    pub full_codelists: Vec<String>,
    /// Authority codelists emitted as `CL.<code>` with only the listed
    /// submission values or concept codes.
    pub codelist_subsets: Vec<(String, Vec<String>)>,
    /// Datasets that get a `CL.DOMAIN.<dataset>` codelist.
    pub domains: Vec<String>,
    pub domain_codelist: String,
    /// Upper bound on concurrent authority lookups during prefetch.
    pub max_parallel: usize,
}

impl Default for DerivationOptions {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            standard_oid: DEFAULT_STANDARD_OID.to_string(),
            full_codelists: Vec::new(),
            codelist_subsets: Vec::new(),
            domains: Vec::new(),
            domain_codelist: DOMAIN_ABBREVIATION_CODELIST.to_string(),
            max_parallel: 4,
        }
    }
}

impl DerivationOptions {
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Repeated codes are dropped, comparing case-insensitively.
    pub fn with_full_codelists(mut self, codes: Vec<String>) -> Self {
        self.full_codelists = owned(authority::distinct_codes("full", &codes));
        self
    }

    pub fn with_codelist_subsets(mut self, subsets: Vec<(String, Vec<String>)>) -> Self {
        self.codelist_subsets = subsets;
        self
    }

    /// Repeated datasets are dropped, comparing case-insensitively.
    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = owned(authority::distinct_codes("domains", &domains));
        self
    }

    /// Every authority codelist the run will need.
    fn authority_keys(&self, spec: &SubsetSpecification) -> Vec<CodelistKey> {
        let mut codes: Vec<&str> = Vec::new();
        let referenced = spec.authority_codes();
        codes.extend(referenced.iter().map(String::as_str));
        codes.extend(self.full_codelists.iter().map(String::as_str));
        codes.extend(self.codelist_subsets.iter().map(|(code, _)| code.as_str()));
        if !self.domains.is_empty() {
            codes.push(&self.domain_codelist);
        }
        codes
            .into_iter()
            .map(|code| CodelistKey::new(&self.package, code))
            .collect()
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationStats {
    pub variables: usize,
    pub derived_variables: usize,
    pub failed_variables: usize,
    /// Lookups that reached the terminology source.
    pub authority_fetches: usize,
}

/// Entities of one run, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivationOutput {
    pub codelists: Vec<Codelist>,
    pub where_clauses: Vec<WhereClause>,
    pub value_level: Vec<ValueLevelMetadata>,
    pub diagnostics: DiagnosticReport,
    pub stats: DerivationStats,
}

impl DerivationOutput {
    pub fn codelist(&self, oid: &str) -> Option<&Codelist> {
        self.codelists.iter().find(|c| c.oid.as_str() == oid)
    }

    pub fn where_clause(&self, oid: &str) -> Option<&WhereClause> {
        self.where_clauses.iter().find(|w| w.oid.as_str() == oid)
    }
}

/// Entities derived for one variable.
#[derive(Debug, Default)]
struct VariableArtifacts {
    codelists: Vec<Codelist>,
    where_clauses: Vec<WhereClause>,
    value_level: Vec<ValueLevelMetadata>,
}

struct VariableOutcome {
    artifacts: Option<VariableArtifacts>,
    diagnostics: Vec<Diagnostic>,
}

/// Derive codelists, where clauses and value-level metadata for `spec`.
///
/// Lookups go through a cache scoped to this call, so each authority
/// codelist is requested from `resolver` at most once.
pub fn derive<R: TerminologyResolver + ?Sized>(
    spec: &SubsetSpecification,
    resolver: &R,
    options: &DerivationOptions,
) -> Result<DerivationOutput, DerivationError> {
    let span = info_span!("derive", variables = spec.len(), package = %options.package);
    let _guard = span.enter();
    let start = Instant::now();
    let cache = CachingResolver::new(resolver);

    let prefetch_start = Instant::now();
    let prefetched = prefetch(&cache, options.authority_keys(spec), options.max_parallel);
    let unavailable = prefetched.iter().filter(|(_, result)| result.is_err()).count();
    info!(
        codelists = prefetched.len(),
        unavailable,
        duration_ms = prefetch_start.elapsed().as_millis(),
        "prefetch complete"
    );

    let subsets = SubsetBuilder::new(&cache, &options.package, &options.standard_oid);
    let mut output = DerivationOutput::default();
    output.stats.variables = spec.len();

    for variable in spec.variables() {
        let outcome = info_span!("variable", key = %variable.key)
            .in_scope(|| derive_variable(variable, &subsets));
        record(&mut output.diagnostics, outcome.diagnostics);
        match outcome.artifacts {
            Some(artifacts) => {
                output.stats.derived_variables += 1;
                output.codelists.extend(artifacts.codelists);
                output.where_clauses.extend(artifacts.where_clauses);
                output.value_level.extend(artifacts.value_level);
            }
            None => output.stats.failed_variables += 1,
        }
    }

    let (supplementary, diagnostics) = authority::supplementary_codelists(&cache, options);
    output.codelists.extend(supplementary);
    record(&mut output.diagnostics, diagnostics);
    output.stats.authority_fetches = cache.fetch_count();

    consistency::check_output(&output)?;

    info!(
        codelists = output.codelists.len(),
        where_clauses = output.where_clauses.len(),
        value_level = output.value_level.len(),
        failed_variables = output.stats.failed_variables,
        errors = output.diagnostics.error_count(),
        warnings = output.diagnostics.warning_count(),
        authority_fetches = output.stats.authority_fetches,
        duration_ms = start.elapsed().as_millis(),
        "derivation complete"
    );
    Ok(output)
}

fn record(report: &mut DiagnosticReport, diagnostics: Vec<Diagnostic>) {
    for diagnostic in &diagnostics {
        warn!(
            kind = %diagnostic.kind,
            severity = ?diagnostic.severity,
            variable = ?diagnostic.variable.as_ref().map(ToString::to_string),
            condition = ?diagnostic.condition,
            "{}",
            diagnostic.message
        );
    }
    report.extend(diagnostics);
}

fn derive_variable<R: TerminologyResolver + ?Sized>(
    spec: &VariableSubsetSpec,
    subsets: &SubsetBuilder<'_, R>,
) -> VariableOutcome {
    let key = &spec.key;
    let mut diagnostics = Vec::new();

    let slots = match spec.slots() {
        Ok(slots) => slots,
        Err(error) => {
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::MisalignedSpecification, error.to_string())
                    .for_variable(key),
            );
            return VariableOutcome {
                artifacts: None,
                diagnostics,
            };
        }
    };

    let tokens: Option<Vec<SlotToken>> = spec.value_level.then(|| {
        oid::slot_tokens(
            slots
                .iter()
                .map(|slot| slot.conditions.first().map_or("", Condition::leading_value)),
        )
    });

    let mut codelists: Vec<Option<Codelist>> = Vec::with_capacity(slots.len());
    let mut failed = false;
    for (idx, slot) in slots.iter().enumerate() {
        let (codelist_oid, name) = match &tokens {
            Some(tokens) => (
                oid::slot_codelist_oid(key, &tokens[idx]),
                format!(
                    "Codelist for {} {} where {}",
                    key.dataset(),
                    key.variable(),
                    tokens[idx].token()
                ),
            ),
            None => (
                oid::variable_codelist_oid(key),
                format!("Codelist for {} {}", key.dataset(), key.variable()),
            ),
        };

        match subsets.build(key, slot, codelist_oid, name) {
            Ok(Some(built)) => {
                diagnostics.extend(built.diagnostics);
                if built.codelist.is_empty() {
                    debug!(codelist = %built.codelist.oid, "dropping codelist without terms");
                    if !spec.value_level && *slot.marker == StandardMarker::NonStandard {
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticKind::MissingTerms,
                                format!("no terms declared for {}", built.codelist.oid),
                            )
                            .for_variable(key)
                            .at_slot(slot.index),
                        );
                    }
                    codelists.push(None);
                } else {
                    codelists.push(Some(built.codelist));
                }
            }
            Ok(None) => codelists.push(None),
            Err(failure) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::ResolutionFailure, failure.to_string())
                        .for_variable(key)
                        .at_slot(slot.index)
                        .with_codelist(failure.codelist.as_str()),
                );
                failed = true;
                codelists.push(None);
            }
        }
    }

    if failed {
        return VariableOutcome {
            artifacts: None,
            diagnostics,
        };
    }

    let Some(tokens) = tokens else {
        return VariableOutcome {
            artifacts: Some(VariableArtifacts {
                codelists: codelists.into_iter().flatten().collect(),
                ..VariableArtifacts::default()
            }),
            diagnostics,
        };
    };

    let where_clauses: Vec<WhereClause> = slots
        .iter()
        .zip(&tokens)
        .map(|(slot, token)| build_where_clause(key, slot.conditions, token))
        .collect();
    let item_oids: Vec<Oid> = tokens.iter().map(|token| oid::item_oid(key, token)).collect();
    let parts: Vec<SlotParts<'_>> = slots
        .iter()
        .enumerate()
        .map(|(idx, slot)| SlotParts {
            slot: *slot,
            where_clause: &where_clauses[idx],
            item_oid: &item_oids[idx],
            codelist: codelists[idx].as_ref(),
        })
        .collect();
    let (value_level, vlm_diagnostics) =
        build_value_level(key, &oid::value_list_oid(key), &parts);
    diagnostics.extend(vlm_diagnostics);

    VariableOutcome {
        artifacts: Some(VariableArtifacts {
            codelists: codelists.into_iter().flatten().collect(),
            where_clauses,
            value_level,
        }),
        diagnostics,
    }
}
