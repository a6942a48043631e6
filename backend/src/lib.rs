//! # xteconv - TISS 5.01.00 monitoring XTE <-> flat table converter
//!
//! Converts ANS health-insurance monitoring messages (XTE/XML, Latin-1)
//! into one flat row per billed procedure, and regroups such rows back into
//! schema-conformant documents with a fresh lot number and content hash.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  XTE files  │────▶│   Decoder   │────▶│  CSV table  │
//! │  (Latin-1)  │     │ (45 cols)   │     │  (;, BOM)   │
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!        ▲                                       │
//!        │            ┌─────────────┐            │
//!        └────────────│   Encoder   │◀───────────┘
//!                     │ (regroup)   │
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xteconv::{decode, encode, Table, Settings};
//!
//! let rows = decode(&std::fs::read("lote.xte")?, "lote.xte")?;
//! let artifacts = encode(&Table::from_records(rows), &Settings::from_env()?.now())?;
//! println!("{} files", artifacts.len());
//! ```
//!
//! ## Modules
//!
//! - [`field_map`] - XML path <-> column mapping and fixed column order
//! - [`dates`] - date format conversion
//! - [`derived`] - age, lot number and content hash
//! - [`models`] - nested document model and row helpers
//! - [`xml`] - charset and element tree serialization
//! - [`transform`] - decoder, grouper, encoder and pipeline
//! - [`table`] - delimited text and `.xlsx` input and output
//! - [`archive`] - ZIP bundles
//! - [`cache`] - decode cache
//! - [`config`] - runtime settings
//! - [`error`] - hierarchical error types
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod field_map;
pub mod models;

// Conversion
pub mod dates;
pub mod derived;
pub mod transform;
pub mod xml;

// Input / output
pub mod archive;
pub mod table;

// Runtime
pub mod cache;
pub mod config;

// HTTP API
pub mod api;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArchiveError, ConfigError, DecodeError, EncodeError, PipelineError, ServerError, TableError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Claim, Document, Header, Procedure, Record};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use field_map::COLUMNS;
pub use transform::decoder::{decode, parse_document};
pub use transform::encoder::{encode, safe_file_stem, ArtifactKind, Artifacts};

// =============================================================================
// Re-exports - Table
// =============================================================================

pub use table::{
    read_table, read_table_file, write_csv, write_csv_file, write_table_file, write_xlsx,
    ParsedTable, Table, TableFormat,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    decode_batch, decode_batch_cached, decode_paths, encode_bytes, encode_file, encode_table,
    write_artifacts, write_bundles, DecodeOutcome, EncodeOutcome, FileFailure, InputFile,
    TableInfo,
};

// =============================================================================
// Re-exports - Runtime
// =============================================================================

pub use cache::DecodeCache;
pub use config::Settings;

pub mod pipeline {
    pub use crate::transform::pipeline::*;
}

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
