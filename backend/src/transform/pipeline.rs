//! High-level pipeline API for XTE <-> table conversion.
//!
//! Combines the steps the CLI and the server share: batch decoding with
//! per-file failure reporting, table encoding, and writing outputs to disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use xteconv::pipeline::{decode_paths, encode_file, write_artifacts};
//! use xteconv::config::Settings;
//! use std::path::{Path, PathBuf};
//!
//! let outcome = decode_paths(&[PathBuf::from("lote.xte")]);
//! println!("Decoded {} rows", outcome.records.len());
//!
//! let settings = Settings::from_env()?;
//! let encoded = encode_file(Path::new("dados.csv"), &settings.now())?;
//! write_artifacts(&encoded.artifacts, Path::new("saida"))?;
//! ```

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::encoder::{self, ArtifactKind, Artifacts};
use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::archive;
use crate::cache::DecodeCache;
use crate::error::{EncodeError, PipelineError, PipelineResult};
use crate::field_map::ORIGIN_COLUMN;
use crate::models::{self, Record};
use crate::table::{self, ParsedTable, Table, TableFormat};

/// One named input document.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A file that could not be decoded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Result of decoding a batch of files
#[derive(Debug, Clone, Default)]
pub struct DecodeOutcome {
    /// Rows of every decoded file, in input order
    pub records: Vec<Record>,

    /// Files that failed, with the reason
    pub failures: Vec<FileFailure>,

    /// Number of files decoded
    pub decoded_files: usize,
}

impl DecodeOutcome {
    /// True when there was input and none of it decoded.
    pub fn all_failed(&self) -> bool {
        self.decoded_files == 0 && !self.failures.is_empty()
    }

    pub fn into_table(self) -> Table {
        Table::from_records(self.records)
    }
}

/// Result of encoding a table
#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    pub artifacts: Artifacts,

    /// Input table metadata
    pub table_info: TableInfo,

    /// Rows left out because their origin cell was empty
    pub skipped_rows: usize,
}

/// Table file information
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub format: TableFormat,
    pub encoding: String,
    pub delimiter: Option<char>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Decode files one after another.
///
/// A failing file is reported and skipped; it never aborts the batch.
pub fn decode_batch(files: &[InputFile]) -> DecodeOutcome {
    decode_batch_cached(files, &mut DecodeCache::new(0))
}

/// [`decode_batch`] through a cache.
pub fn decode_batch_cached(files: &[InputFile], cache: &mut DecodeCache) -> DecodeOutcome {
    log_info(format!("📖 Decoding {} file(s)...", files.len()));

    let mut outcome = DecodeOutcome::default();
    for file in files {
        match cache.decode(&file.name, &file.bytes) {
            Ok(rows) => {
                log_success(format!("{}: {} rows", file.name, rows.len()));
                outcome.records.extend(rows);
                outcome.decoded_files += 1;
            }
            Err(e) => {
                log_error(format!("{}: {}", file.name, e));
                outcome.failures.push(FileFailure {
                    file: file.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    log_decode_summary(&outcome);
    outcome
}

/// Read and decode files from disk. Unreadable files count as failures.
pub fn decode_paths(paths: &[PathBuf]) -> DecodeOutcome {
    let mut inputs = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();

    for path in paths {
        let name = display_name(path);
        match fs::read(path) {
            Ok(bytes) => inputs.push(InputFile::new(name, bytes)),
            Err(e) => {
                log_error(format!("{}: {}", name, e));
                unreadable.push(FileFailure {
                    file: name,
                    error: e.to_string(),
                });
            }
        }
    }

    let mut outcome = decode_batch(&inputs);
    outcome.failures.extend(unreadable);
    outcome
}

fn log_decode_summary(outcome: &DecodeOutcome) {
    if outcome.failures.is_empty() {
        log_success(format!(
            "📊 {} rows from {} file(s)",
            outcome.records.len(),
            outcome.decoded_files
        ));
    } else {
        log_warning(format!(
            "📊 {} rows from {} file(s), {} failed",
            outcome.records.len(),
            outcome.decoded_files,
            outcome.failures.len()
        ));
    }
}

/// Encode an already-read table.
pub fn encode_table(table: &Table, now: &DateTime<FixedOffset>) -> PipelineResult<Artifacts> {
    let (artifacts, _) = encode_counting_skipped(table, now)?;
    Ok(artifacts)
}

fn encode_counting_skipped(
    table: &Table,
    now: &DateTime<FixedOffset>,
) -> PipelineResult<(Artifacts, usize)> {
    if !table.has_column(ORIGIN_COLUMN) {
        return Err(EncodeError::MissingColumn(ORIGIN_COLUMN.to_string()).into());
    }
    if table.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    log_info("🔄 Regrouping rows into documents...");
    let artifacts = encoder::encode(table, now)?;

    let skipped = table
        .records
        .iter()
        .filter(|r| models::text(r, ORIGIN_COLUMN).is_none())
        .count();
    if skipped > 0 {
        log_warning(format!("{} row(s) without '{}' skipped", skipped, ORIGIN_COLUMN));
    }
    for origin in &artifacts.replaced {
        log_warning(format!("{}: output name already used, earlier document replaced", origin));
    }

    log_success(format!(
        "📦 {} document(s), {} file(s)",
        artifacts.documents,
        artifacts.len()
    ));
    Ok((artifacts, skipped))
}

/// Read table bytes and encode them.
pub fn encode_bytes(bytes: &[u8], now: &DateTime<FixedOffset>) -> PipelineResult<EncodeOutcome> {
    let parsed = table::read_table(bytes)?;
    encode_parsed(parsed, now)
}

/// Read a table file and encode it.
pub fn encode_file(path: &Path, now: &DateTime<FixedOffset>) -> PipelineResult<EncodeOutcome> {
    let parsed = table::read_table_file(path)?;
    encode_parsed(parsed, now)
}

fn encode_parsed(parsed: ParsedTable, now: &DateTime<FixedOffset>) -> PipelineResult<EncodeOutcome> {
    log_info("📖 Reading table...");
    match parsed.delimiter {
        Some(delimiter) => {
            log_success(format!("Detected encoding: {}", parsed.encoding));
            log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
        }
        None => log_success("Detected spreadsheet workbook"),
    }
    log_success(format!("Read {} rows", parsed.table.len()));

    let table_info = TableInfo {
        format: parsed.format,
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.table.headers.clone(),
        row_count: parsed.table.len(),
    };

    let (artifacts, skipped_rows) = encode_counting_skipped(&parsed.table, now)?;
    Ok(EncodeOutcome {
        artifacts,
        table_info,
        skipped_rows,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

/// Write every artifact into `dir`, creating it if needed.
pub fn write_artifacts(artifacts: &Artifacts, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(artifacts.len());
    for (name, bytes) in &artifacts.files {
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        written.push(path);
    }
    Ok(written)
}

/// Write the `.xml` and `.xte` ZIP bundles into `dir`.
pub fn write_bundles(artifacts: &Artifacts, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(ArtifactKind::ALL.len());
    for kind in ArtifactKind::ALL {
        let path = dir.join(archive::bundle_name(kind));
        fs::write(&path, archive::bundle(artifacts, kind)?)?;
        written.push(path);
    }
    Ok(written)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_now, record, sample_bytes};

    #[test]
    fn test_batch_reports_failures_and_keeps_going() {
        let files = vec![
            InputFile::new("a.xte", sample_bytes()),
            InputFile::new("broken.xte", b"<ans:mensagemTISS>".to_vec()),
            InputFile::new("b.xte", sample_bytes()),
        ];

        let outcome = decode_batch(&files);
        assert_eq!(outcome.decoded_files, 2);
        assert_eq!(outcome.records.len(), 6);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].file, "broken.xte");
        assert!(!outcome.all_failed());

        // rows keep input order
        assert_eq!(outcome.records[0][ORIGIN_COLUMN], "a.xte");
        assert_eq!(outcome.records[5][ORIGIN_COLUMN], "b.xte");
    }

    #[test]
    fn test_all_failed() {
        let files = vec![InputFile::new("x.xte", b"not xml <".to_vec())];
        assert!(decode_batch(&files).all_failed());
        assert!(!decode_batch(&[]).all_failed());
    }

    #[test]
    fn test_cached_batch() {
        let mut cache = DecodeCache::new(8);
        let files = vec![InputFile::new("a.xte", sample_bytes())];

        decode_batch_cached(&files, &mut cache);
        let again = decode_batch_cached(&files, &mut cache);

        assert_eq!(again.records.len(), 3);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_decode_paths_with_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("lote.xte");
        fs::write(&good, sample_bytes()).unwrap();
        let missing = dir.path().join("nao_existe.xte");

        let outcome = decode_paths(&[good, missing]);
        assert_eq!(outcome.decoded_files, 1);
        assert_eq!(outcome.records[0][ORIGIN_COLUMN], "lote.xte");
        assert_eq!(outcome.failures[0].file, "nao_existe.xte");
    }

    #[test]
    fn test_encode_bytes_from_exported_table() {
        let outcome = decode_batch(&[InputFile::new("lote.xte", sample_bytes())]);
        let csv = table::write_csv(&outcome.records).unwrap();

        let encoded = encode_bytes(&csv, &fixed_now()).unwrap();
        assert_eq!(encoded.table_info.delimiter, Some(';'));
        assert_eq!(encoded.table_info.row_count, 3);
        assert_eq!(encoded.artifacts.documents, 1);
        assert!(encoded.artifacts.files.contains_key("lote.xte"));
        assert_eq!(encoded.skipped_rows, 0);
    }

    #[test]
    fn test_encode_bytes_from_workbook() {
        let outcome = decode_batch(&[InputFile::new("lote.xte", sample_bytes())]);
        let xlsx = table::write_xlsx(&outcome.records).unwrap();

        let encoded = encode_bytes(&xlsx, &fixed_now()).unwrap();
        assert_eq!(encoded.table_info.format, TableFormat::Xlsx);
        assert_eq!(encoded.table_info.row_count, 3);

        let back = decode_batch(&[InputFile::new(
            "lote.xte",
            encoded.artifacts.files["lote.xte"].clone(),
        )]);
        assert_eq!(back.records.len(), 3);
        for (a, b) in outcome.records.iter().zip(&back.records) {
            assert_eq!(a["numeroGuia_prestador"], b["numeroGuia_prestador"]);
            assert_eq!(a["codigoProcedimento"], b["codigoProcedimento"]);
            assert_eq!(a["dataNascimento"], b["dataNascimento"]);
        }
    }

    #[test]
    fn test_encode_counts_skipped_rows() {
        let table = Table::new(
            vec![ORIGIN_COLUMN.to_string()],
            vec![record(&[(ORIGIN_COLUMN, "a.xte")]), record(&[("sexo", "F")])],
        );
        let (artifacts, skipped) = encode_counting_skipped(&table, &fixed_now()).unwrap();
        assert_eq!(artifacts.documents, 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_encode_errors() {
        let empty = Table::new(vec![ORIGIN_COLUMN.to_string()], Vec::new());
        assert!(matches!(
            encode_table(&empty, &fixed_now()),
            Err(PipelineError::EmptyInput)
        ));

        let no_origin = encode_bytes(b"sexo;senha\nF;X", &fixed_now());
        assert!(matches!(
            no_origin,
            Err(PipelineError::Encode(EncodeError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_header_only_table_without_origin_is_missing_column() {
        let result = encode_bytes(b"sexo;senha\n", &fixed_now());
        assert!(matches!(
            result,
            Err(PipelineError::Encode(EncodeError::MissingColumn(c))) if c == ORIGIN_COLUMN
        ));
    }

    #[test]
    fn test_write_artifacts_and_bundles() {
        let outcome = decode_batch(&[InputFile::new("lote.xte", sample_bytes())]);
        let artifacts = encode_table(&outcome.into_table(), &fixed_now()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = write_artifacts(&artifacts, dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(dir.path().join("lote.xml").exists());
        assert!(dir.path().join("lote.xte").exists());

        let bundles = write_bundles(&artifacts, &dir.path().join("zips")).unwrap();
        assert_eq!(bundles.len(), 2);
        assert!(dir.path().join("zips/arquivos_xte_tiss5.zip").exists());
    }
}
