use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::ExportError;
use crate::record::ResultTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes `table` as comma-separated UTF-8 with a byte-order mark, which
/// spreadsheet programs need to pick the right encoding for Hangul text.
pub fn write_csv(table: &ResultTable, path: &Path) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(UTF8_BOM).map_err(io_err)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(io_err)?;
    Ok(())
}
