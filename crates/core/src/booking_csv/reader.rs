//! Shared CSV reader setup for imports.

use std::fs::File;
use std::path::Path;

use crate::error::{BmrError, Result};

/// Open a header-driven CSV reader on `path`.
///
/// Fields are trimmed of surrounding whitespace. The header row is read
/// eagerly so that an unreadable or empty file fails here rather than on
/// the first record.
pub fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(e, path))?;

    let headers = rdr.headers().map_err(|e| csv_error(e, path))?;
    if headers.is_empty() {
        return Err(BmrError::Serialization(format!(
            "{} has no header row",
            path.display()
        )));
    }

    Ok(rdr)
}

pub(crate) fn csv_error(err: csv::Error, path: &Path) -> BmrError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => BmrError::Io(io),
        _ => BmrError::Serialization(format!(
            "CSV parse error in {}: {message}",
            path.display()
        )),
    }
}
