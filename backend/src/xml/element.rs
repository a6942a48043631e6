//! Element tree for generated TISS documents.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use super::charset;
use crate::error::{EncodeError, EncodeResult};
use crate::field_map::TISS_PREFIX;

/// One XML element with optional text and ordered children.
///
/// Mixed content is not modelled: an element carries text or children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name, e.g. `ans:cabecalho`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Element with a literal (already qualified) name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Element in the TISS namespace, `ans:{local}`.
    pub fn tiss(local: &str) -> Self {
        Self::new(qualified(local))
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child and return a handle to it.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Last child with the given qualified name, created if absent.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        let idx = match self.children.iter().rposition(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.children.push(Element::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Walk `ans:`-qualified path segments, creating containers as needed.
    pub fn ensure_tiss_path<'a, I>(&mut self, segments: I) -> &mut Element
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for segment in segments {
            current = current.ensure_child(&qualified(segment));
        }
        current
    }

    /// First child with the given qualified name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text of this element and all descendants, depth-first.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text.trim());
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// `ans:{local}`.
pub fn qualified(local: &str) -> String {
    format!("{TISS_PREFIX}:{local}")
}

/// Serialize a document: declaration, two-space indentation, Latin-1 bytes.
pub fn to_bytes(root: &Element) -> EncodeResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some(charset::DECLARED_ENCODING),
            None,
        )))
        .map_err(|e| EncodeError::Serialize(format!("XML declaration: {e}")))?;

    write_element(&mut writer, root)?;

    let mut xml = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| EncodeError::Serialize(e.to_string()))?;
    xml.push('\n');

    Ok(charset::encode(&xml))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> EncodeResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.text.is_none() && element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| EncodeError::Serialize(format!("<{}/>: {e}", element.name)));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| EncodeError::Serialize(format!("<{}>: {e}", element.name)))?;

    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| EncodeError::Serialize(format!("text of {}: {e}", element.name)))?;
    }

    for child in &element.children {
        write_element(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| EncodeError::Serialize(format!("</{}>: {e}", element.name)))?;

    Ok(())
}
