//! JSON diagnostics report of a derivation run.

use std::fs;
use std::path::Path;

use define_core::DerivationOutput;
use define_model::{Codelist, Diagnostic};
use serde::Serialize;

use crate::error::{OutputError, Result};

pub const REPORT_FILE_NAME: &str = "diagnostics.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub variables: usize,
    pub derived_variables: usize,
    pub failed_variables: usize,
    pub authority_fetches: usize,
    pub codelists: usize,
    pub codelist_terms: usize,
    pub where_clauses: usize,
    pub value_level: usize,
    pub errors: usize,
    pub warnings: usize,
}

/// Run summary plus every diagnostic, in the order they were raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsReport<'a> {
    pub summary: ReportSummary,
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> DiagnosticsReport<'a> {
    pub fn from_output(output: &'a DerivationOutput) -> Self {
        let stats = output.stats;
        Self {
            summary: ReportSummary {
                variables: stats.variables,
                derived_variables: stats.derived_variables,
                failed_variables: stats.failed_variables,
                authority_fetches: stats.authority_fetches,
                codelists: output.codelists.len(),
                codelist_terms: output.codelists.iter().map(Codelist::len).sum(),
                where_clauses: output.where_clauses.len(),
                value_level: output.value_level.len(),
                errors: output.diagnostics.error_count(),
                warnings: output.diagnostics.warning_count(),
            },
            diagnostics: &output.diagnostics.diagnostics,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write the report for `output` to `path`.
pub fn write_report(path: &Path, output: &DerivationOutput) -> Result<()> {
    let json = DiagnosticsReport::from_output(output).to_json()?;
    fs::write(path, json).map_err(|source| OutputError::Report {
        path: path.to_path_buf(),
        source,
    })
}
