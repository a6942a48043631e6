//! XTE document -> flat rows.
//!
//! # Row layout
//!
//! ```text
//! cabecalho ─┐
//!            ├─ claim 1 ── procedure a   →  row (origin, header, claim 1, a, age)
//!            │          └─ procedure b   →  row (origin, header, claim 1, b, age)
//!            └─ claim 2 (no procedures)  →  row (origin, header, claim 2, nulls, age)
//! ```
//!
//! Header and claim fields are repeated on every row they own. Rows are
//! projected onto [`COLUMNS`], so every row has all 45 columns in order.

use roxmltree::Node;
use serde_json::Value;

use crate::dates;
use crate::derived;
use crate::error::DecodeResult;
use crate::field_map::{
    is_date_column, Field, AGE_COLUMN, BIRTH_DATE_COLUMN, CLAIM_ELEMENT, CLAIM_FIELDS, COLUMNS,
    HEADER_ELEMENT, HEADER_FIELDS, ORIGIN_COLUMN, PROCEDURE_ELEMENT, PROCEDURE_FIELDS,
    SERVICE_DATE_COLUMN, TISS_NAMESPACE,
};
use crate::models::{self, Claim, Document, FieldValues, Header, Procedure, Record};
use crate::xml::charset;

/// Decode one XTE document into flat rows.
///
/// `origin` is written into the `Nome da Origem` column of every row.
/// Fails only when the bytes are not well-formed XML.
pub fn decode(bytes: &[u8], origin: &str) -> DecodeResult<Vec<Record>> {
    let document = parse_document(bytes, origin)?;
    Ok(flatten(&document))
}

/// Parse Latin-1 document bytes into the nested model.
///
/// A missing header leaves every header field null.
pub fn parse_document(bytes: &[u8], origin: &str) -> DecodeResult<Document> {
    let text = charset::decode(bytes);
    let tree = roxmltree::Document::parse(&text)?;
    let root = tree.root_element();

    let header = root
        .descendants()
        .find(|n| is_tiss(n, HEADER_ELEMENT))
        .map(|node| Header {
            values: extract(node, &HEADER_FIELDS),
        })
        .unwrap_or_default();

    let claims = root
        .descendants()
        .filter(|n| is_tiss(n, CLAIM_ELEMENT))
        .map(parse_claim)
        .collect();

    Ok(Document {
        origin: origin.to_string(),
        header,
        claims,
    })
}

fn parse_claim(node: Node<'_, '_>) -> Claim {
    let procedures = node
        .descendants()
        .skip(1)
        .filter(|n| is_tiss(n, PROCEDURE_ELEMENT))
        .map(|proc| Procedure {
            values: extract(proc, &PROCEDURE_FIELDS),
        })
        .collect();

    Claim {
        values: extract(node, &CLAIM_FIELDS),
        procedures,
    }
}

/// Trimmed, non-empty text for each field found under `node`.
fn extract(node: Node<'_, '_>, fields: &'static [Field]) -> FieldValues {
    fields
        .iter()
        .filter_map(|field| {
            let segments: Vec<&str> = field.segments().collect();
            let text = leaf_text(find_path(node, &segments)?);
            let text = text.trim();
            (!text.is_empty()).then(|| (field.column, text.to_string()))
        })
        .collect()
}

/// Text children joined, so comments or processing instructions inside a
/// leaf do not hide its value.
fn leaf_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

/// First element reached by following `segments` through TISS children.
fn find_path<'a, 'input>(node: Node<'a, 'input>, segments: &[&str]) -> Option<Node<'a, 'input>> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(node);
    };
    node.children()
        .filter(|child| is_tiss(child, first))
        .find_map(|child| find_path(child, rest))
}

fn is_tiss(node: &Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(TISS_NAMESPACE)
}

/// Flatten a parsed document: one row per procedure, or one per claim
/// without procedures.
pub fn flatten(document: &Document) -> Vec<Record> {
    let mut rows = Vec::with_capacity(document.row_count());
    for claim in &document.claims {
        if claim.procedures.is_empty() {
            rows.push(flat_row(document, claim, None));
        } else {
            for procedure in &claim.procedures {
                rows.push(flat_row(document, claim, Some(procedure)));
            }
        }
    }
    rows
}

fn flat_row(document: &Document, claim: &Claim, procedure: Option<&Procedure>) -> Record {
    let mut row = Record::new();
    for &column in COLUMNS.iter() {
        let value = match column {
            ORIGIN_COLUMN => Value::String(document.origin.clone()),
            AGE_COLUMN => continue,
            _ => match lookup(document, claim, procedure, column) {
                Some(v) if is_date_column(column) => Value::String(dates::to_table(v)),
                other => models::cell(other),
            },
        };
        row.insert(column.to_string(), value);
    }

    let age = derived::age_at_service(
        models::text(&row, BIRTH_DATE_COLUMN),
        models::text(&row, SERVICE_DATE_COLUMN),
    );
    row.insert(AGE_COLUMN.to_string(), age.map(Value::from).unwrap_or(Value::Null));
    row
}

fn lookup<'a>(
    document: &'a Document,
    claim: &'a Claim,
    procedure: Option<&'a Procedure>,
    column: &str,
) -> Option<&'a str> {
    document
        .header
        .values
        .get(column)
        .or_else(|| claim.values.get(column))
        .or_else(|| procedure.and_then(|p| p.values.get(column)))
        .map(String::as_str)
}
