//! CSV sink for the worksheets.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use define_core::DerivationOutput;
use tracing::{debug, info};

use crate::error::{OutputError, Result};
use crate::sheet::{Sheet, build_sheets};

/// Write `sheet` as CSV, headers first.
pub fn write_sheet<W: Write>(writer: W, sheet: &Sheet) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render `sheet` as CSV text.
pub fn render_csv(sheet: &Sheet) -> Result<String> {
    let mut buffer = Vec::new();
    write_sheet(&mut buffer, sheet).map_err(|source| OutputError::Csv {
        path: PathBuf::from(sheet.kind.file_name()),
        source,
    })?;
    String::from_utf8(buffer).map_err(|_| OutputError::Encoding {
        sheet: sheet.kind.name(),
    })
}

/// Write the three worksheets of `output` into `dir`, creating it if
/// needed. Returns the written paths in sheet order.
pub fn write_outputs(dir: &Path, output: &DerivationOutput) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for sheet in build_sheets(output) {
        let path = dir.join(sheet.kind.file_name());
        let file = fs::File::create(&path).map_err(|source| OutputError::Csv {
            path: path.clone(),
            source: source.into(),
        })?;
        write_sheet(file, &sheet).map_err(|source| OutputError::Csv {
            path: path.clone(),
            source,
        })?;
        debug!(sheet = sheet.kind.name(), rows = sheet.len(), path = %path.display(), "worksheet written");
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "worksheets written");
    Ok(written)
}
