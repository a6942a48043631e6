//! Domain models for the XTE conversion pipeline.
//!
//! - [`Document`] - one monitoring message (header + claims)
//! - [`Header`] - transaction identification of the message
//! - [`Claim`] - one monitored beneficiary event (`monitoramentoSaudeSuplementar`)
//! - [`Procedure`] - one billed line of a claim (`procedimentosRealizados`)
//! - [`Record`] - one flat table row
//!
//! All of these are rebuilt from input on every call; nothing is persisted.
//! Field values are keyed by the column names of [`crate::field_map`].

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::field_map::{CNPJ_COLUMN, CPF_COLUMN};

/// Present field values, keyed by column name. Absent means null.
pub type FieldValues = BTreeMap<&'static str, String>;

/// One flat table row: column name -> text, number (age) or null.
pub type Record = Map<String, Value>;

// =============================================================================
// Document
// =============================================================================

/// Message header (`cabecalho`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub values: FieldValues,
}

/// One billed line of a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Procedure {
    pub values: FieldValues,
}

/// One monitored event with its procedures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claim {
    pub values: FieldValues,
    pub procedures: Vec<Procedure>,
}

impl Claim {
    /// Keep at most one contracted-provider tax id.
    ///
    /// The personal id (CPF) wins over the corporate one (CNPJ).
    pub fn resolve_tax_id(&mut self) {
        if self.values.contains_key(CPF_COLUMN) {
            self.values.remove(CNPJ_COLUMN);
        }
    }
}

/// One monitoring message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Originating file name, or the origin value it is regrouped under.
    pub origin: String,
    pub header: Header,
    pub claims: Vec<Claim>,
}

impl Document {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Number of flat rows this document becomes.
    pub fn row_count(&self) -> usize {
        self.claims.iter().map(|c| c.procedures.len().max(1)).sum()
    }
}

// =============================================================================
// Record helpers
// =============================================================================

/// Non-empty, trimmed text of a cell. Null, numbers and blank text are `None`.
pub fn text<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record
        .get(column)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Cell value for an optional string.
pub fn cell(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::String(v.to_string()),
        None => Value::Null,
    }
}

/// Copy the listed columns of a record into field values.
pub fn values_from_record(record: &Record, columns: impl IntoIterator<Item = &'static str>) -> FieldValues {
    columns
        .into_iter()
        .filter_map(|column| text(record, column).map(|v| (column, v.to_string())))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
