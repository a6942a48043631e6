//! Flat table input and output.
//!
//! Reads delimited text with encoding and delimiter auto-detection, or an
//! `.xlsx` workbook, and writes the fixed 45-column export in either form.
//! Every cell is text; blank cells are null.

pub mod spreadsheet;
pub mod writer;

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{TableError, TableResult};
use crate::field_map::COLUMNS;
use crate::models::Record;
use crate::xml::charset;

pub use spreadsheet::{is_xlsx, parse_xlsx, write_xlsx, write_xlsx_file};
pub use writer::{template, write_csv, write_csv_file, DELIMITER, UTF8_BOM};

/// On-disk table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Delimited text
    Csv,
    /// Spreadsheet workbook
    Xlsx,
}

impl TableFormat {
    /// Format implied by a file name; anything but `.xlsx` is text.
    pub fn of_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => TableFormat::Xlsx,
            _ => TableFormat::Csv,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Xlsx => "xlsx",
        }
    }
}

/// Rows plus the column names they were read with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    /// Table over decoder output, which always carries the fixed columns.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A table with what was detected while reading it.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub table: Table,
    pub format: TableFormat,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter, none for workbooks
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    if bytes.starts_with(UTF8_BOM) {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to UTF-8 when the bytes are valid UTF-8 and
/// to Latin-1 otherwise.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => charset::decode(bytes),
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => charset::decode(bytes),
        },
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse delimited text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use xteconv::table::parse_table;
///
/// let table = parse_table("Nome da Origem;sexo\na.xte;F\nb.xte;", ';').unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.records[0]["sexo"], "F");
/// assert!(table.records[1]["sexo"].is_null());
/// ```
pub fn parse_table(content: &str, delimiter: char) -> TableResult<Table> {
    if content.trim().is_empty() {
        return Err(TableError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::NoHeaders);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = match row.get(i).map(str::trim) {
                Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                _ => Value::Null,
            };
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    Ok(Table::new(headers, records))
}

/// Parse table bytes with auto-detection of format, encoding and delimiter.
pub fn read_table(bytes: &[u8]) -> TableResult<ParsedTable> {
    if bytes.is_empty() {
        return Err(TableError::Empty);
    }

    if is_xlsx(bytes) {
        return Ok(ParsedTable {
            table: parse_xlsx(bytes)?,
            format: TableFormat::Xlsx,
            encoding: "utf-8".to_string(),
            delimiter: None,
        });
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_table(&content, delimiter)?;

    Ok(ParsedTable {
        table,
        format: TableFormat::Csv,
        encoding,
        delimiter: Some(delimiter),
    })
}

/// Parse a table file with auto-detection of encoding and delimiter.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> TableResult<ParsedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    read_table(&bytes)
}

/// Export rows to `path`, as a workbook when it ends in `.xlsx`.
pub fn write_table_file<P: AsRef<Path>>(path: P, records: &[Record]) -> TableResult<()> {
    let path = path.as_ref();
    match TableFormat::of_path(path) {
        TableFormat::Xlsx => write_xlsx_file(path, records),
        TableFormat::Csv => write_csv_file(path, records),
    }
}
