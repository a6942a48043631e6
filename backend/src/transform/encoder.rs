//! Flat rows -> XTE documents.
//!
//! Rows are grouped per origin (one document each) and per provider guide
//! number (one claim each). The header is synthesized from the first row of
//! the origin and the clock; the epilogue carries the MD5 of the header and
//! body text.
//!
//! Each document is emitted twice, as `.xml` and `.xte`, with identical bytes.

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::derived;
use crate::error::{EncodeError, EncodeResult};
use crate::field_map::{
    schema_location, Field, BODY_ELEMENT, CLAIM_ELEMENT, CLAIM_FIELDS, COMPETENCY_COLUMN,
    EPILOGUE_ELEMENT, EVENTS_ELEMENT, HASH_ELEMENT, HEADER_ELEMENT, HEADER_FIELDS,
    HEADER_REGISTRY_COLUMN, ISSUE_DATE_COLUMN, OPERATOR_ELEMENT, ORIGIN_COLUMN,
    PROCEDURE_ELEMENT, PROCEDURE_FIELDS, ROOT_ELEMENT, TISS_NAMESPACE, TISS_PREFIX, TISS_VERSION,
    TRANSACTION_TYPE, XSD_NAMESPACE, XSI_NAMESPACE,
};
use crate::models::{self, Claim, Document, FieldValues, Header, Record};
use crate::table::Table;
use crate::transform::grouper;
use crate::xml::{self, element::qualified, Element};

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_\-]").expect("valid regex"));

/// Output flavour. Both carry the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Xml,
    Xte,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Xml, ArtifactKind::Xte];

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Xml => "xml",
            ArtifactKind::Xte => "xte",
        }
    }

    /// Kind of a file name, by extension.
    pub fn of(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(ArtifactKind::Xml),
            "xte" => Ok(ArtifactKind::Xte),
            other => Err(format!("unknown artifact kind: {other}")),
        }
    }
}

/// Generated files, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    pub files: BTreeMap<String, Vec<u8>>,
    /// Documents built, one per distinct origin.
    pub documents: usize,
    /// Origins whose output replaced an earlier origin's with the same name.
    pub replaced: Vec<String>,
}

impl Artifacts {
    /// Files of one kind, in name order.
    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.files
            .iter()
            .filter(move |(name, _)| ArtifactKind::of(name) == Some(kind))
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Encode a table into one document per origin.
///
/// The table must carry the `Nome da Origem` column. Rows with an empty
/// origin are skipped.
pub fn encode(table: &Table, now: &DateTime<FixedOffset>) -> EncodeResult<Artifacts> {
    if !table.has_column(ORIGIN_COLUMN) {
        return Err(EncodeError::MissingColumn(ORIGIN_COLUMN.to_string()));
    }

    let mut artifacts = Artifacts::default();
    for (origin, rows) in grouper::group_by_origin(&table.records) {
        if rows.is_empty() {
            continue;
        }

        let document = build_document(&origin, &rows, now);
        let bytes = render(&document)?;
        let stem = safe_file_stem(&origin);

        for kind in ArtifactKind::ALL {
            let name = format!("{stem}.{}", kind.extension());
            if artifacts.files.insert(name, bytes.clone()).is_some() && kind == ArtifactKind::Xml {
                artifacts.replaced.push(origin.clone());
            }
        }
        artifacts.documents += 1;
    }

    Ok(artifacts)
}

/// Nested model for the rows of one origin.
pub fn build_document(origin: &str, rows: &[&Record], now: &DateTime<FixedOffset>) -> Document {
    let header = rows
        .first()
        .map(|first| synthesize_header(first, now))
        .unwrap_or_default();

    let issue_date = now.format("%Y-%m-%d").to_string();
    let claims = grouper::rows_to_claims(rows)
        .into_iter()
        .map(|mut claim| {
            claim.values.insert(ISSUE_DATE_COLUMN, issue_date.clone());
            claim
        })
        .collect();

    Document {
        origin: origin.to_string(),
        header,
        claims,
    }
}

fn synthesize_header(first: &Record, now: &DateTime<FixedOffset>) -> Header {
    let competency = models::text(first, COMPETENCY_COLUMN);

    let mut values = FieldValues::new();
    values.insert("tipoTransacao", TRANSACTION_TYPE.to_string());
    values.insert("numeroLote", derived::lot_number(competency, now));
    if let Some(c) = competency {
        values.insert(COMPETENCY_COLUMN, c.to_string());
    }
    values.insert("dataRegistroTransacao", now.format("%Y-%m-%d").to_string());
    values.insert("horaRegistroTransacao", now.format("%H:%M:%S").to_string());
    if let Some(registry) = models::text(first, HEADER_REGISTRY_COLUMN) {
        values.insert(HEADER_REGISTRY_COLUMN, registry.to_string());
    }
    values.insert("versaoPadrao_cabecalho", TISS_VERSION.to_string());

    Header { values }
}

/// Serialize a document, computing its epilogue hash.
pub fn render(document: &Document) -> EncodeResult<Vec<u8>> {
    xml::to_bytes(&document_element(document))
}

/// Full `mensagemTISS` tree.
pub fn document_element(document: &Document) -> Element {
    let mut root = Element::tiss(ROOT_ELEMENT)
        .with_attribute("xmlns:xsi", XSI_NAMESPACE)
        .with_attribute("xmlns:xsd", XSD_NAMESPACE)
        .with_attribute("xsi:schemaLocation", schema_location())
        .with_attribute(format!("xmlns:{TISS_PREFIX}"), TISS_NAMESPACE);

    let mut header = Element::tiss(HEADER_ELEMENT);
    fill(&mut header, &HEADER_FIELDS, &document.header.values);

    let mut body = Element::tiss(BODY_ELEMENT);
    let operator = body.push(Element::tiss(OPERATOR_ELEMENT));
    for claim in &document.claims {
        operator.push(claim_element(claim));
    }

    let hash = derived::content_hash(&(header.text_content() + &body.text_content()));

    root.push(header);
    root.push(body);
    root.push(Element::tiss(EPILOGUE_ELEMENT))
        .push(Element::tiss(HASH_ELEMENT).with_text(hash));
    root
}

fn claim_element(claim: &Claim) -> Element {
    let mut element = Element::tiss(CLAIM_ELEMENT);
    fill(&mut element, &CLAIM_FIELDS, &claim.values);

    // containers already exist, so procedures land after the event fields
    // and before totaisGuia
    let events = element.ensure_child(&qualified(EVENTS_ELEMENT));
    for procedure in &claim.procedures {
        let mut item = Element::tiss(PROCEDURE_ELEMENT);
        fill(&mut item, &PROCEDURE_FIELDS, &procedure.values);
        events.push(item);
    }
    element
}

/// Lay out `fields` under `parent`.
///
/// Containers are always created; a leaf only when it has a value.
fn fill(parent: &mut Element, fields: &[Field], values: &FieldValues) {
    for field in fields {
        let segments: Vec<&str> = field.segments().collect();
        let Some((leaf, containers)) = segments.split_last() else {
            continue;
        };
        let container = parent.ensure_tiss_path(containers.iter().copied());
        if let Some(value) = values.get(field.column) {
            container.push(Element::tiss(leaf).with_text(value.as_str()));
        }
    }
}

/// File-system-safe stem for an origin.
///
/// The last extension is dropped and every character outside
/// `[A-Za-z0-9_-]` becomes `_`.
pub fn safe_file_stem(origin: &str) -> String {
    UNSAFE_NAME_CHARS
        .replace_all(strip_extension(origin), "_")
        .into_owned()
}

fn strip_extension(name: &str) -> &str {
    let base_start = name.rfind(|c| c == '/' || c == '\\').map_or(0, |i| i + 1);
    match name[base_start..].rfind('.') {
        // a leading dot names a hidden file, not an extension
        Some(0) | None => name,
        Some(dot) => &name[..base_start + dot],
    }
}
