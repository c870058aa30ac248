//! Tabular exporter: spreadsheet first, delimited text as the fallback.

pub mod delimited;
pub mod xlsx;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::error::ExportError;
use crate::profile::ExportLayout;
use crate::record::ResultTable;

/// `<prefix>_<YYYYmmdd_HHMMSS>.xlsx` in the working directory.
pub fn default_output_path(prefix: &str, now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("{prefix}_{}.xlsx", now.format("%Y%m%d_%H%M%S")))
}

/// Writes `table` to `path` and returns the path actually written.
///
/// A failed spreadsheet write gets one recovery attempt (missing parent
/// directories created, stale file removed) before falling back to CSV at
/// the same stem.
pub fn export(
    table: &ResultTable,
    path: &Path,
    layout: &ExportLayout,
) -> Result<PathBuf, ExportError> {
    if table.is_empty() {
        return Err(ExportError::EmptyTable);
    }

    match xlsx::write_xlsx(table, path, layout) {
        Ok(()) => return Ok(saved(path, table)),
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "spreadsheet write failed, preparing destination and retrying"
        ),
    }

    if let Err(err) = prepare_destination(path) {
        warn!(path = %path.display(), error = %err, "destination recovery failed");
    }
    match xlsx::write_xlsx(table, path, layout) {
        Ok(()) => return Ok(saved(path, table)),
        Err(err) => warn!(
            path = %path.display(),
            error = %err,
            "spreadsheet retry failed, saving as CSV instead"
        ),
    }

    let csv_path = path.with_extension("csv");
    delimited::write_csv(table, &csv_path)?;
    Ok(saved(&csv_path, table))
}

fn saved(path: &Path, table: &ResultTable) -> PathBuf {
    info!(path = %path.display(), rows = table.len(), "results saved");
    path.to_path_buf()
}

fn prepare_destination(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if path.is_file() {
        fs::remove_file(path)?;
    }
    Ok(())
}
