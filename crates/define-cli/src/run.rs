//! Derivation run: specification in, worksheets and report out.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use define_core::{DerivationOptions, DerivationOutput, derive};
use define_ingest::{load_inclusions, load_specification, write_specification};
use define_model::{Severity, SubsetSpecification, VariableKey};
use define_output::{REPORT_FILE_NAME, write_outputs, write_report};
use define_terminology::{
    CatalogResolver, LibraryClient, MemoryResolver, TerminologyResolver, package_id_for,
};

use crate::config::{RunConfig, TerminologyConfig};

/// Inputs of one derivation run, after CLI and configuration are merged.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub specification: PathBuf,
    pub inclusions: Option<PathBuf>,
    /// Where to write the enriched specification, if anywhere.
    pub write_spec: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Never contact the Library.
    pub offline: bool,
    /// Derive and report without writing worksheets.
    pub dry_run: bool,
    pub config: RunConfig,
}

#[derive(Debug)]
pub struct RunResult {
    pub output: DerivationOutput,
    pub variables: Vec<VariableSummary>,
    pub output_dir: PathBuf,
    /// Worksheets written, in sheet order; empty for dry runs.
    pub files: Vec<PathBuf>,
    pub report: Option<PathBuf>,
    pub enriched_spec: Option<PathBuf>,
    /// Human-readable terminology source.
    pub terminology: String,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        self.output.diagnostics.has_errors()
    }
}

/// Per-variable counts for the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSummary {
    pub key: VariableKey,
    pub value_level: bool,
    /// `None` when the variable is misaligned.
    pub slots: Option<usize>,
    pub codelists: usize,
    pub where_clauses: usize,
    pub value_level_rows: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// A terminology source chosen from configuration.
pub struct SelectedResolver {
    pub resolver: Box<dyn TerminologyResolver>,
    /// Package provided by an offline CT file.
    pub package: Option<String>,
}

pub fn select_resolver(config: &RunConfig, offline: bool) -> Result<SelectedResolver> {
    let terminology: &TerminologyConfig = &config.terminology;
    if let Some(path) = &terminology.ct_file {
        let mut catalog = CatalogResolver::new();
        let package = catalog
            .load_file(path)
            .with_context(|| format!("load CT file {}", path.display()))?;
        return Ok(SelectedResolver {
            resolver: Box::new(catalog),
            package: Some(package),
        });
    }
    if offline {
        warn!("offline run without a CT file: authority codelists cannot be resolved");
        return Ok(SelectedResolver {
            resolver: Box::new(MemoryResolver::new()),
            package: None,
        });
    }
    let library = config.library_config();
    if library.api_key.is_none() {
        warn!(
            env = %terminology.api_key_env,
            "no CDISC Library API key set; requests will likely be rejected"
        );
    }
    let client = LibraryClient::new(&library).context("create CDISC Library client")?;
    Ok(SelectedResolver {
        resolver: Box::new(client),
        package: None,
    })
}

/// Load the specification and attach external inclusion lists.
pub fn load_enriched(
    specification: &Path,
    inclusions: Option<&Path>,
) -> Result<SubsetSpecification> {
    let spec = load_specification(specification)
        .with_context(|| format!("load specification {}", specification.display()))?;
    match inclusions {
        Some(path) => load_inclusions(&spec, path)
            .with_context(|| format!("apply inclusion lists {}", path.display())),
        None => Ok(spec),
    }
}

pub fn run_derivation(request: &RunRequest) -> Result<RunResult> {
    let span = info_span!("run", spec = %request.specification.display());
    let _guard = span.enter();
    let start = Instant::now();

    let spec = load_enriched(&request.specification, request.inclusions.as_deref())?;
    info!(variables = spec.len(), "specification loaded");

    let enriched_spec = match &request.write_spec {
        Some(path) => {
            write_specification(path, &spec)
                .with_context(|| format!("write specification {}", path.display()))?;
            info!(path = %path.display(), "enriched specification written");
            Some(path.clone())
        }
        None => None,
    };

    let selected = select_resolver(&request.config, request.offline)?;
    let mut options: DerivationOptions = request.config.derivation_options();
    if let Some(package) = selected.package
        && package != options.package
    {
        warn!(
            configured = %options.package,
            file = %package,
            "CT file provides a different package; using the file's package"
        );
        options.package = package;
    }
    let terminology = selected.resolver.describe();

    let output = derive(&spec, selected.resolver.as_ref(), &options)
        .context("derivation aborted")?;
    let variables = summarize(&spec, &output);

    let (files, report) = if request.dry_run {
        info!("dry run: no files written");
        (Vec::new(), None)
    } else {
        let files = write_outputs(&request.output_dir, &output).context("write worksheets")?;
        let report_path = request.output_dir.join(REPORT_FILE_NAME);
        write_report(&report_path, &output).context("write diagnostics report")?;
        (files, Some(report_path))
    };

    info!(
        files = files.len(),
        errors = output.diagnostics.error_count(),
        warnings = output.diagnostics.warning_count(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunResult {
        output,
        variables,
        output_dir: request.output_dir.clone(),
        files,
        report,
        enriched_spec,
        terminology,
    })
}

/// Count what each declared variable contributed to `output`.
pub fn summarize(spec: &SubsetSpecification, output: &DerivationOutput) -> Vec<VariableSummary> {
    spec.variables()
        .iter()
        .map(|variable| {
            let key = &variable.key;
            let (dataset, name) = (key.dataset(), key.variable());
            let prefix = format!("CL.{dataset}.{name}");
            let owned_codelist = |oid: &str| {
                oid == prefix
                    || oid
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            };
            let (errors, warnings) = output.diagnostics.for_variable(key).fold(
                (0, 0),
                |(errors, warnings), diagnostic| match diagnostic.severity {
                    Severity::Error => (errors + 1, warnings),
                    Severity::Warning => (errors, warnings + 1),
                },
            );
            VariableSummary {
                key: key.clone(),
                value_level: variable.value_level,
                slots: variable.slot_count().ok(),
                codelists: output
                    .codelists
                    .iter()
                    .filter(|c| owned_codelist(c.oid.as_str()))
                    .count(),
                where_clauses: output
                    .where_clauses
                    .iter()
                    .filter(|w| w.dataset == dataset && w.owner == name)
                    .count(),
                value_level_rows: output
                    .value_level
                    .iter()
                    .filter(|v| v.dataset == dataset && v.variable == name)
                    .count(),
                errors,
                warnings,
            }
        })
        .collect()
}

/// Alignment status of every variable, without resolving anything.
pub fn check_specification(
    specification: &Path,
    inclusions: Option<&Path>,
) -> Result<Vec<(VariableKey, Result<usize, String>)>> {
    let spec = load_enriched(specification, inclusions)?;
    Ok(spec
        .variables()
        .iter()
        .map(|variable| {
            (
                variable.key.clone(),
                variable.slot_count().map_err(|error| error.to_string()),
            )
        })
        .collect())
}
