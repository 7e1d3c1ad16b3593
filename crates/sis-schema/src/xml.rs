//! Minimal element tree over `quick-xml` events.
//!
//! Every SIS document (catalog, install manifest, local database) is a small
//! element-based XML file. Rather than binding each format to serde structs,
//! the documents are read into a generic [`Element`] tree and the format
//! modules dispatch on element names through lookup tables.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Errors raised while reading or writing an XML document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The document contains no element at all.
    #[error("document has no root element")]
    Empty,

    /// The root element is not the one the format requires.
    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        /// Tag name the format requires.
        expected: String,
        /// Tag name found in the document.
        found: String,
    },

    /// An element lacks an attribute the format requires.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Tag name of the offending element.
        element: String,
        /// Name of the missing attribute.
        attribute: String,
    },

    /// The document could not be serialized.
    #[error("failed to write XML: {0}")]
    Write(String),
}

/// An XML element with its attributes, child elements and text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Concatenated (trimmed) text content.
    pub text: String,
}

impl Element {
    /// Create an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder-style attribute setter that skips `None`.
    pub fn with_opt_attr(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with_attr(key, v),
            None => self,
        }
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of an attribute that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingAttribute`] when the attribute is absent.
    pub fn required_attr(&self, name: &str) -> Result<&str, XmlError> {
        self.attr(name).ok_or_else(|| XmlError::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    /// Iterate over the direct children with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first child with the given tag name, when non-empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Parse a document and return its root element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Malformed`] for syntax errors, unbalanced tags or
    /// multiple roots, and [`XmlError::Empty`] when there is no element.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(open_element(&start)?),
                Ok(Event::Empty(start)) => {
                    let element = open_element(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(text)) => {
                    if let Some(top) = stack.last_mut() {
                        let value = text
                            .unescape()
                            .map_err(|e| XmlError::Malformed(e.to_string()))?;
                        top.text.push_str(&value);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(XmlError::Malformed(format!(
                        "at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Malformed(format!("unclosed element <{}>", open.name)));
        }
        root.ok_or(XmlError::Empty)
    }

    /// Parse a document whose root element must be `expected`.
    ///
    /// # Errors
    ///
    /// Same as [`Element::parse`], plus [`XmlError::UnexpectedRoot`].
    pub fn parse_root(text: &str, expected: &str) -> Result<Self, XmlError> {
        let root = Self::parse(text)?;
        if root.name != expected {
            return Err(XmlError::UnexpectedRoot {
                expected: expected.to_string(),
                found: root.name,
            });
        }
        Ok(root)
    }

    /// Serialize this element as a standalone, indented document.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Write`] if the writer fails.
    pub fn to_document(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_failed)?;
        write_element(&mut writer, self)?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(write_failed)
    }
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| XmlError::Malformed(e.to_string()))?
        .to_string();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::Malformed("multiple root elements".to_string()));
    }
    *root = Some(element);
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_failed)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_failed)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(write_failed)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_failed)?;
    Ok(())
}

fn write_failed(err: impl std::fmt::Display) -> XmlError {
    XmlError::Write(err.to_string())
}
