//! Minimal owned XML element tree.
//!
//! DAS servers differ in the case they use for tag and attribute names, so
//! this tree keeps names verbatim and every lookup compares them
//! case-insensitively. Only elements, attributes and text survive parsing;
//! comments, processing instructions and the DOCTYPE are dropped.

use crate::error::ParseError;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    content: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Trimmed text content, `None` when there is none.
    pub fn content(&self) -> Option<&str> {
        let text = self.content.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Depth-first, document-order search of the descendants (not `self`).
    pub fn find_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.is_named(name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }
}

/// Parses `xml` into a synthetic, unnamed document node whose children are
/// the top-level elements.
pub fn parse_xml_document(xml: &str) -> Result<XmlElement, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = vec![XmlElement::default()];
    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::Xml(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, element)?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ParseError::Xml("unbalanced closing tag".to_string()));
                }
                if let Some(element) = stack.pop() {
                    attach(&mut stack, element)?;
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::Xml(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.content.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.content
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(ParseError::Xml(format!("unclosed element <{open}>")));
    }
    let document = stack.pop().unwrap_or_default();
    if !document.has_children() {
        return Err(ParseError::Xml("document has no root element".to_string()));
    }
    Ok(document)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, ParseError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ParseError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| ParseError::Xml(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], element: XmlElement) -> Result<(), ParseError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| ParseError::Xml("element outside of document".to_string()))?;
    parent.children.push(element);
    Ok(())
}
