//! Thin element-tree layer over `quick-xml`.
//!
//! The codec never looks at raw events: documents are tokenized into an
//! ordered [`XmlElement`] tree first, and the saver builds a tree which is then
//! written out in one go.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, TsxError};

/// An element with ordered attributes, ordered child elements and its
/// concatenated text content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }
}

/// Tokenize a whole document into its root element.
pub fn parse(content: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(open_element(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let element = open_element(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut element = stack.pop().ok_or_else(|| {
                    TsxError::malformed(format!("unexpected closing tag </{name}>"))
                })?;
                if element.name != name {
                    return Err(TsxError::malformed(format!(
                        "mismatched end tag: expected </{}>, found </{}>",
                        element.name, name
                    )));
                }
                // Indentation between child elements is not content.
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| TsxError::malformed(format!("invalid text content: {err}")))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            // Declarations, comments, processing instructions, doctype.
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(TsxError::malformed(format!(
                    "{err} at byte {}",
                    reader.error_position()
                )));
            }
        }
    }

    if let Some(node) = stack.last() {
        return Err(TsxError::malformed(format!(
            "unexpected end of document, expected </{}>",
            node.name
        )));
    }

    root.ok_or_else(|| TsxError::malformed("document has no root element"))
}

fn open_element(e: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| TsxError::malformed(format!("attribute error: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| TsxError::malformed(format!("invalid value for '{key}': {err}")))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(TsxError::malformed("document has multiple root elements"));
        }
        None => *root = Some(element),
    }
    Ok(())
}

/// Write `root` as a complete document (declaration included), one-space indented
/// the way Tiled itself writes `.tsx` files.
pub fn write<W: Write>(root: &XmlElement, out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 1);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(TsxError::write_failure)?;
    write_element(&mut writer, root)?;
    writer
        .get_mut()
        .write_all(b"\n")
        .map_err(TsxError::WriteFailure)?;
    writer.get_mut().flush().map_err(TsxError::WriteFailure)
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(TsxError::write_failure);
    }

    writer
        .write_event(Event::Start(start))
        .map_err(TsxError::write_failure)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(TsxError::write_failure)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(TsxError::write_failure)
}
