//! `.xlsx` import and export.
//!
//! Export writes one sheet in the fixed column order, with the age as a
//! number and everything else as text. Import reads the first sheet and
//! turns every cell back into text, so identifiers with leading zeros and
//! monetary strings survive the trip.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

use super::Table;
use crate::dates;
use crate::error::{TableError, TableResult};
use crate::field_map::COLUMNS;
use crate::models::Record;

/// Name of the exported sheet.
pub const SHEET_NAME: &str = "Dados";

/// Local file header of a ZIP container, which every `.xlsx` starts with.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// True when `bytes` look like an `.xlsx` workbook rather than text.
pub fn is_xlsx(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Export rows as a single-sheet workbook.
pub fn write_xlsx(records: &[Record]) -> TableResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, &column) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, column, &bold)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, &column) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            match record.get(column) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => {
                    sheet.write_string(row, col, s)?;
                }
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(row, col, f)?;
                    }
                    None => {
                        sheet.write_string(row, col, n.to_string())?;
                    }
                },
                Some(other) => {
                    sheet.write_string(row, col, other.to_string())?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Export rows to a workbook file.
pub fn write_xlsx_file<P: AsRef<Path>>(path: P, records: &[Record]) -> TableResult<()> {
    let bytes = write_xlsx(records)?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Read the first sheet of a workbook. The first row holds the column names.
pub fn parse_xlsx(bytes: &[u8]) -> TableResult<Table> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(TableError::Empty)??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(TableError::Empty)?
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in rows {
        let cells: Vec<Option<String>> = row.iter().map(cell_text).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }

        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = match cells.get(i) {
                Some(Some(text)) => Value::String(text.clone()),
                _ => Value::Null,
            };
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    Ok(Table::new(headers, records))
}

/// Trimmed text of a cell, `None` when blank.
///
/// Whole numbers lose the `.0` a spreadsheet adds; date cells use the table
/// date convention.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format(dates::TABLE_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_map::{AGE_COLUMN, ORIGIN_COLUMN};
    use crate::test_support::{record, sample_bytes};
    use crate::transform::decoder;
    use serde_json::json;

    #[test]
    fn test_decoded_rows_round_trip_as_text() {
        let rows = decoder::decode(&sample_bytes(), "lote.xte").unwrap();
        let bytes = write_xlsx(&rows).unwrap();
        assert!(is_xlsx(&bytes));

        let table = parse_xlsx(&bytes).unwrap();
        assert_eq!(table.headers, COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        assert_eq!(table.len(), rows.len());

        for (written, read) in rows.iter().zip(&table.records) {
            for &column in COLUMNS.iter() {
                let expected = match &written[column] {
                    Value::Null => Value::Null,
                    Value::String(s) => Value::String(s.clone()),
                    other => Value::String(other.to_string()),
                };
                assert_eq!(read[column], expected, "column {column}");
            }
        }
    }

    #[test]
    fn test_leading_zeros_and_age() {
        let mut row = record(&[(ORIGIN_COLUMN, "a.xte"), ("numeroCarteira", "0001234500")]);
        row.insert(AGE_COLUMN.into(), json!(44));

        let table = parse_xlsx(&write_xlsx(&[row]).unwrap()).unwrap();
        assert_eq!(table.records[0]["numeroCarteira"], "0001234500");
        assert_eq!(table.records[0][AGE_COLUMN], "44");
        assert!(table.records[0]["senha"].is_null());
    }

    #[test]
    fn test_header_only_workbook() {
        let table = parse_xlsx(&write_xlsx(&[]).unwrap()).unwrap();
        assert!(table.has_column(ORIGIN_COLUMN));
        assert!(table.is_empty());
    }

    #[test]
    fn test_not_a_workbook() {
        assert!(!is_xlsx(b"Nome da Origem;sexo\n"));
        assert!(parse_xlsx(b"PK\x03\x04garbage").is_err());
    }

    #[test]
    fn test_write_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.xlsx");
        write_xlsx_file(&path, &[]).unwrap();
        assert!(is_xlsx(&std::fs::read(&path).unwrap()));
    }
}
