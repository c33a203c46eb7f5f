use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use define_cli::run::{RunResult, VariableSummary};
use define_model::{Diagnostic, Severity};

pub fn print_summary(result: &RunResult) {
    println!("Terminology: {}", result.terminology);
    if result.files.is_empty() {
        println!("Output: dry run, nothing written");
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    if let Some(path) = &result.report {
        println!("Diagnostics report: {}", path.display());
    }
    if let Some(path) = &result.enriched_spec {
        println!("Specification: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("VLM"),
        header_cell("Slots"),
        header_cell("Codelists"),
        header_cell("Where Clauses"),
        header_cell("VLM Rows"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for index in 2..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for variable in &result.variables {
        table.add_row(variable_row(variable));
    }

    let output = &result.output;
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(output.codelists.len()).add_attribute(Attribute::Bold),
        Cell::new(output.where_clauses.len()).add_attribute(Attribute::Bold),
        Cell::new(output.value_level.len()).add_attribute(Attribute::Bold),
        count_cell(output.diagnostics.error_count(), Color::Red).add_attribute(Attribute::Bold),
        count_cell(output.diagnostics.warning_count(), Color::Yellow)
            .add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!(
        "Authority fetches: {}  Failed variables: {}",
        output.stats.authority_fetches, output.stats.failed_variables
    );
    print_diagnostic_table(&output.diagnostics.diagnostics);
}

fn variable_row(variable: &VariableSummary) -> Vec<Cell> {
    let key_cell = if variable.slots.is_none() {
        Cell::new(&variable.key).fg(Color::Red)
    } else {
        Cell::new(&variable.key)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold)
    };
    vec![
        key_cell,
        if variable.value_level {
            Cell::new("✓").fg(Color::Green)
        } else {
            dim_cell("-")
        },
        variable.slots.map_or_else(|| dim_cell("-"), Cell::new),
        Cell::new(variable.codelists),
        Cell::new(variable.where_clauses),
        Cell::new(variable.value_level_rows),
        count_cell(variable.errors, Color::Red),
        count_cell(variable.warnings, Color::Yellow),
    ]
}

fn print_diagnostic_table(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let mut ordered: Vec<&Diagnostic> = diagnostics.iter().collect();
    // Errors first; the sort is stable so run order is kept within a severity.
    ordered.sort_by_key(|d| severity_rank(d.severity));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Kind"),
        header_cell("Variable"),
        header_cell("Condition"),
        header_cell("Codelist"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for diagnostic in ordered {
        table.add_row(vec![
            severity_cell(diagnostic.severity),
            Cell::new(diagnostic.kind),
            optional_cell(diagnostic.variable.as_ref()),
            optional_cell(diagnostic.condition),
            optional_cell(diagnostic.codelist_code.as_deref()),
            Cell::new(&diagnostic.message),
        ]);
    }
    println!();
    println!("Diagnostics:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Error => 0,
        Severity::Warning => 1,
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell<T: ToString>(value: Option<T>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
