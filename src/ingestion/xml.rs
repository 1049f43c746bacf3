//! Compendium XML Tree
//!
//! Reads a compendium document into a small owned element tree using
//! `quick-xml` events. The entity parsers walk this tree rather than the
//! event stream so they can look children up by name, in document order.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::xml::parse_document;
//!
//! let root = parse_document("<compendium><spell><name>Light</name></spell></compendium>")?;
//! let spell = root.child("spell").unwrap();
//! assert_eq!(spell.child_text("name"), Some("Light"));
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IngestError, Result};

// ============================================================================
// Element
// ============================================================================

/// One element of a parsed compendium document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local element name (`class`, `autolevel`, `text`, ...)
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Concatenated direct text content (CDATA included), untrimmed
    pub raw_text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| IngestError::XmlParse(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| IngestError::XmlParse(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            raw_text: String::new(),
        })
    }

    /// Trimmed text content of this element.
    pub fn text(&self) -> &str {
        self.raw_text.trim()
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Whether a child with the given name exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Trimmed text of the first child with the given name, if present and non-empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text).filter(|t| !t.is_empty())
    }

    /// Text of the first named child, or the empty string.
    pub fn child_text_or_empty(&self, name: &str) -> &str {
        self.child(name).map(Element::text).unwrap_or("")
    }

    /// Integer value of the first named child (leading digits only).
    pub fn child_int(&self, name: &str) -> Option<i32> {
        self.child_text(name).and_then(leading_int)
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether an attribute carries the compendium's `YES` flag.
    pub fn attr_is_yes(&self, name: &str) -> bool {
        self.attr(name)
            .map(|v| v.trim().eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }

    /// Whether a child element carries the compendium's `YES` flag (`<ritual>YES</ritual>`).
    pub fn child_is_yes(&self, name: &str) -> bool {
        self.child_text(name)
            .map(|v| v.eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }

    /// Trimmed texts of every named child, in order, skipping empty ones.
    pub fn texts_of(&self, name: &str) -> Vec<String> {
        self.children_named(name)
            .map(|c| c.text().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Parse the leading signed integer of a string ("17 (natural armor)" -> 17).
pub fn leading_int(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

// ============================================================================
// Document Reader
// ============================================================================

/// Parse a complete document and return its root element.
///
/// Fails with [`IngestError::XmlParse`] on malformed markup, mismatched
/// tags, unclosed elements, or a document without a root element.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_some() {
                    return Err(IngestError::XmlParse(
                        "content after root element".to_string(),
                    ));
                }
                stack.push(Element::from_start(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let element = Element::from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => {
                        return Err(IngestError::XmlParse(
                            "content after root element".to_string(),
                        ))
                    }
                }
            }
            Ok(Event::End(_)) => {
                let finished = stack.pop().ok_or_else(|| {
                    IngestError::XmlParse("unexpected closing tag".to_string())
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(finished),
                    None => root = Some(finished),
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| IngestError::XmlParse(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    append_text(&mut current.raw_text, &text);
                } else if !text.trim().is_empty() {
                    return Err(IngestError::XmlParse(
                        "text outside of root element".to_string(),
                    ));
                }
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                if let Some(current) = stack.last_mut() {
                    append_text(&mut current.raw_text, &String::from_utf8_lossy(&bytes));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IngestError::XmlParse(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(IngestError::XmlParse(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| IngestError::XmlParse("document has no root element".to_string()))
}

fn append_text(buffer: &mut String, text: &str) {
    if text.contains('\r') {
        buffer.push_str(&text.replace("\r\n", "\n"));
    } else {
        buffer.push_str(text);
    }
}

// ============================================================================
// Tests
// ============================================================================
