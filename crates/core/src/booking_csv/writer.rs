//! Generic table writer used by every export.

use std::path::Path;

use crate::error::{BmrError, Result};

use super::rows::CsvTable;

/// Write `rows` to `path` as CSV, header first.
///
/// The header is written even when there are no rows. Parent directories are
/// created as needed and an existing file is replaced.
pub fn write_table<T: CsvTable>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| BmrError::Io(std::io::Error::other(e)))?;

    wtr.write_record(T::HEADER)
        .map_err(|e| BmrError::Serialization(format!("CSV write error: {e}")))?;

    for row in rows {
        wtr.serialize(row)
            .map_err(|e| BmrError::Serialization(format!("CSV write error: {e}")))?;
    }

    wtr.flush()?;
    Ok(())
}
