use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use tracing::info_span;

use define_cli::config::RunConfig;
use define_cli::run::{RunRequest, RunResult, check_specification, run_derivation};

use crate::cli::{DeriveArgs, ValidateArgs};
use crate::summary::{apply_table_style, header_cell};

pub fn run_derive(args: &DeriveArgs) -> Result<RunResult> {
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let mut config = RunConfig::discover(args.config.as_deref(), &cwd)?;
    if let Some(package) = &args.package {
        config.terminology.package = package.clone();
    }
    if let Some(path) = &args.ct_file {
        config.terminology.ct_file = Some(path.clone());
    }

    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        args.specification
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("define")
    });
    let request = RunRequest {
        specification: args.specification.clone(),
        inclusions: args.inclusions.clone(),
        write_spec: args.write_spec.clone(),
        output_dir,
        offline: args.offline,
        dry_run: args.dry_run,
        config,
    };
    run_derivation(&request)
}

/// Print the alignment status of every variable; `Ok(false)` when any is
/// misaligned.
pub fn run_validate(args: &ValidateArgs) -> Result<bool> {
    let span = info_span!("validate", spec = %args.specification.display());
    let statuses = span.in_scope(|| {
        check_specification(&args.specification, args.inclusions.as_deref())
    })?;

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Slots"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    let mut valid = true;
    for (key, status) in statuses {
        let (slots, status) = match status {
            Ok(count) => (Cell::new(count), Cell::new("ok").fg(Color::Green)),
            Err(message) => {
                valid = false;
                (Cell::new("-").fg(Color::DarkGrey), Cell::new(message).fg(Color::Red))
            }
        };
        table.add_row(vec![Cell::new(key), slots, status]);
    }
    println!("{table}");
    Ok(valid)
}
