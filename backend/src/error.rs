//! Error types for the XTE conversion pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`DecodeError`] - XML document could not be parsed
//! - [`EncodeError`] - table could not be turned into XML documents
//! - [`TableError`] - table could not be read or written
//! - [`ArchiveError`] - ZIP bundle could not be built
//! - [`ConfigError`] - invalid runtime setting
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Missing optional fields, unparsable dates and unparsable ages are never
//! errors; they resolve to null or pass through unchanged.

use thiserror::Error;

// =============================================================================
// Decode Errors (XML -> rows)
// =============================================================================

/// Errors while decoding one XTE document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The document is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Malformed(#[from] roxmltree::Error),
}

// =============================================================================
// Encode Errors (rows -> XML)
// =============================================================================

/// Errors while encoding a table into XTE documents.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A column the encoder cannot work without is absent from the table.
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    /// The XML writer failed.
    #[error("Failed to serialize XML: {0}")]
    Serialize(String),
}

// =============================================================================
// Table Errors
// =============================================================================

/// Errors reading or writing tables (delimited text or workbooks).
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to read or write a file.
    #[error("Table IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("Invalid table format: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be read.
    #[error("Invalid spreadsheet: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    /// Workbook could not be written.
    #[error("Spreadsheet write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Input has no content at all.
    #[error("Table is empty")]
    Empty,

    /// First line carries no column names.
    #[error("No headers found in table")]
    NoHeaders,
}

// =============================================================================
// Archive Errors
// =============================================================================

/// Errors building ZIP bundles.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// ZIP writer failure.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO failure while writing entries.
    #[error("Archive IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the functions in
/// [`crate::transform::pipeline`]. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decoding error.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Encoding error.
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Table error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Archive error.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Output directory or file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to process.
    #[error("No input to process")]
    EmptyInput,

    /// Every file in a batch failed.
    #[error("All {0} files failed to decode")]
    AllFailed(usize),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for encode operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // EncodeError -> PipelineError
        let encode_err = EncodeError::MissingColumn("Nome da Origem".into());
        let pipeline_err: PipelineError = encode_err.into();
        assert!(pipeline_err.to_string().contains("Nome da Origem"));

        // TableError -> PipelineError
        let table_err = TableError::Empty;
        let pipeline_err: PipelineError = table_err.into();
        assert!(pipeline_err.to_string().contains("empty"));
    }

    #[test]
    fn test_decode_error_wraps_parser_message() {
        let parse_err = roxmltree::Document::parse("<a><b></a>").unwrap_err();
        let err: DecodeError = parse_err.into();
        assert!(err.to_string().starts_with("Malformed XML"));
    }

    #[test]
    fn test_config_error_format() {
        let err = ConfigError::InvalidValue {
            name: "XTECONV_PORT",
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("XTECONV_PORT"));
        assert!(msg.contains("abc"));
    }
}
