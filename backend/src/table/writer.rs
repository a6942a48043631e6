//! `;`-delimited export with a UTF-8 byte-order mark.
//!
//! The mark makes spreadsheet tools pick UTF-8 instead of the system
//! code page when opening the file.

use serde_json::Value;
use std::path::Path;

use crate::error::{TableError, TableResult};
use crate::field_map::COLUMNS;
use crate::models::Record;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Field separator of exported tables.
pub const DELIMITER: u8 = b';';

/// Export rows in the fixed column order. Null cells are empty.
pub fn write_csv(records: &[Record]) -> TableResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(COLUMNS.iter())?;
    for record in records {
        writer.write_record(COLUMNS.iter().map(|&column| cell_text(record.get(column))))?;
    }

    writer
        .into_inner()
        .map_err(|e| TableError::Io(e.into_error()))
}

/// Export rows to a file.
pub fn write_csv_file<P: AsRef<Path>>(path: P, records: &[Record]) -> TableResult<()> {
    let bytes = write_csv(records)?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Header-only export, a blank template to fill in.
pub fn template() -> TableResult<Vec<u8>> {
    write_csv(&[])
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
