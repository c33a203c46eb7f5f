//! Output of a derivation run.
//!
//! - **Worksheets**: `codelists.csv`, `whereclauses.csv` and
//!   `valuelevel.csv`, each with a fixed column set (see [`columns`])
//! - **Diagnostics**: `diagnostics.json`, a run summary plus every
//!   diagnostic raised

pub mod columns;
mod csv_sink;
mod error;
mod report;
mod sheet;

pub use columns::{
    CodelistColumn, Column, ConditionRecord, TermRecord, VALUE_SEPARATOR, ValueLevelColumn,
    WhereClauseColumn,
};
pub use csv_sink::{render_csv, write_outputs, write_sheet};
pub use error::{OutputError, Result};
pub use report::{DiagnosticsReport, REPORT_FILE_NAME, ReportSummary, write_report};
pub use sheet::{
    Sheet, SheetKind, build_sheets, codelist_sheet, value_level_sheet, where_clause_sheet,
};
