//! XML document loader
//!
//! Builds an owned, immutable element tree from FZP and SVG sources on top of
//! the `quick-xml` event reader. Tag names are stored without their namespace
//! prefix (`svg:g` becomes `g`); attribute keys are kept as written so that
//! prefixed attributes such as `xlink:href` or `inkscape:label` stay distinct.
//!
//! Files are decoded from the encoding named in their XML declaration (or
//! byte-order mark), UTF-8 otherwise. Nesting is capped at
//! [`MAX_DEPTH`] levels, the same default limit libxml2 applies.
//!
//! The tree carries no parent links. Code that needs the ancestors of an
//! element asks for the path from the root with [`Element::path_to`].

use std::fmt;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Deepest element nesting accepted by [`XmlParser`].
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("{message} (at byte {position})")]
    Malformed { message: String, position: u64 },
    #[error("Unclosed element <{0}> at end of document")]
    UnclosedElement(String),
    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),
    #[error("Document has no root element")]
    NoRoot,
    #[error("Document has more than one root element (found <{0}>)")]
    MultipleRoots(String),
    #[error("Text content outside the root element")]
    TextOutsideRoot,
    #[error("Element <{name}> is nested deeper than {limit} levels")]
    TooDeep { name: String, limit: usize },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Xml(#[from] XmlError),
}

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.name == name
    }

    /// First direct child with the given tag.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Pre-order walk over this element and everything below it.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element (in document order) below or at `self` with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.descendants().find(|e| e.id() == Some(id))
    }

    /// Path from `self` down to the first element matching `pred`, both ends
    /// included. `None` when nothing matches.
    pub fn path_to<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Option<Vec<&'a Element>> {
        let mut path = Vec::new();
        if self.collect_path(pred, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    /// Visit every element at or below `self` in document order, together
    /// with its path from `self`.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&[&'a Element])) {
        let mut path = Vec::new();
        self.walk_inner(&mut path, f);
    }

    fn walk_inner<'a>(&'a self, path: &mut Vec<&'a Element>, f: &mut dyn FnMut(&[&'a Element])) {
        path.push(self);
        f(path);
        for child in &self.children {
            child.walk_inner(path, f);
        }
        path.pop();
    }

    fn collect_path<'a>(
        &'a self,
        pred: &dyn Fn(&Element) -> bool,
        path: &mut Vec<&'a Element>,
    ) -> bool {
        path.push(self);
        if pred(self) {
            return true;
        }
        for child in &self.children {
            if child.collect_path(pred, path) {
                return true;
            }
        }
        path.pop();
        false
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        if let Some(id) = self.id() {
            write!(f, " id=\"{}\"", id)?;
        }
        write!(f, ">")
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// A parsed XML document. Dropping it releases the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn descendants(&self) -> Descendants<'_> {
        self.root.descendants()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.root.find_by_id(id)
    }

    /// Parse a document from a string.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        XmlParser::new(input).parse()
    }

    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path)?;
        Ok(XmlParser::from_bytes(&bytes).parse()?)
    }
}

/// Event-driven tree builder.
pub struct XmlParser<'a> {
    reader: Reader<&'a [u8]>,
    stack: Vec<Element>,
    root: Option<Element>,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_reader(Reader::from_str(input))
    }

    /// Parser over raw file contents. The encoding is taken from the XML
    /// declaration once it has been read.
    pub fn from_bytes(input: &'a [u8]) -> Self {
        Self::with_reader(Reader::from_reader(input))
    }

    fn with_reader(mut reader: Reader<&'a [u8]>) -> Self {
        reader.config_mut().check_end_names = true;
        Self {
            reader,
            stack: Vec::new(),
            root: None,
        }
    }

    pub fn parse(mut self) -> Result<Document, XmlError> {
        loop {
            let event = self.reader.read_event().map_err(|e| XmlError::Malformed {
                message: e.to_string(),
                position: self.reader.error_position() as u64,
            })?;
            match event {
                Event::Start(e) => {
                    let element = self.start_element(&e)?;
                    self.stack.push(element);
                }
                Event::Empty(e) => {
                    let element = self.start_element(&e)?;
                    self.close_element(element)?;
                }
                Event::End(e) => {
                    let name = self.decode(e.local_name().as_ref())?;
                    let mut element = self
                        .stack
                        .pop()
                        .ok_or_else(|| XmlError::UnexpectedEnd(name.clone()))?;
                    if element.name != name {
                        return Err(XmlError::UnexpectedEnd(name));
                    }
                    if let Some(text) = &element.text {
                        if text.trim().is_empty() {
                            element.text = None;
                        }
                    }
                    self.close_element(element)?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| self.malformed(e))?;
                    self.push_text(&text)?;
                }
                Event::CData(c) => {
                    let text = self.decode(&c)?;
                    self.push_text(&text)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctypes
                // carry nothing the checks look at.
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(XmlError::UnclosedElement(open.name.clone()));
        }
        let root = self.root.ok_or(XmlError::NoRoot)?;
        Ok(Document { root })
    }

    fn malformed(&self, e: quick_xml::Error) -> XmlError {
        XmlError::Malformed {
            message: e.to_string(),
            position: self.reader.buffer_position() as u64,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, XmlError> {
        self.reader
            .decoder()
            .decode(bytes)
            .map(|s| s.into_owned())
            .map_err(|e| self.malformed(e))
    }

    fn start_element(&self, start: &BytesStart<'_>) -> Result<Element, XmlError> {
        let name = self.decode(start.local_name().as_ref())?;
        if self.stack.is_empty() && self.root.is_some() {
            return Err(XmlError::MultipleRoots(name));
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(XmlError::TooDeep {
                name,
                limit: MAX_DEPTH,
            });
        }
        let mut element = Element::new(&name);
        let decoder = self.reader.decoder();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.malformed(e.into()))?;
            let key = self.decode(attr.key.as_ref())?;
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|e| self.malformed(e))?;
            element.attributes.push((key, value.into_owned()));
        }
        Ok(element)
    }

    fn close_element(&mut self, element: Element) -> Result<(), XmlError> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if self.root.is_some() {
                    return Err(XmlError::MultipleRoots(element.name));
                }
                self.root = Some(element);
            }
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) -> Result<(), XmlError> {
        match self.stack.last_mut() {
            Some(current) => {
                current.text.get_or_insert_with(String::new).push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(XmlError::TextOutsideRoot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let doc = Document::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <module moduleId="m1">
                <title>Resistor</title>
                <views><breadboardView/></views>
            </module>"#,
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.name, "module");
        assert_eq!(root.attr("moduleId"), Some("m1"));
        assert_eq!(root.child("title").unwrap().text.as_deref(), Some("Resistor"));
        assert!(root.child("views").unwrap().child("breadboardView").is_some());
        assert_eq!(root.text, None);
    }

    #[test]
    fn test_namespace_prefix_stripped_from_tags() {
        let doc = Document::parse(
            r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:g id="breadboard"/></svg:svg>"#,
        )
        .unwrap();
        assert_eq!(doc.root().name, "svg");
        assert_eq!(doc.find_by_id("breadboard").unwrap().name, "g");
        assert_eq!(
            doc.root().attr("xmlns:svg"),
            Some("http://www.w3.org/2000/svg")
        );
    }

    #[test]
    fn test_entities_and_cdata() {
        let doc = Document::parse(
            "<svg><title>A &amp; B</title><style><![CDATA[.pin { fill: red; }]]></style></svg>",
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.child("title").unwrap().text.as_deref(), Some("A & B"));
        assert_eq!(
            root.child("style").unwrap().text.as_deref(),
            Some(".pin { fill: red; }")
        );
    }

    #[test]
    fn test_mismatched_end_tag_is_rejected() {
        assert!(Document::parse("<module><title></module>").is_err());
    }

    #[test]
    fn test_unclosed_element_is_rejected() {
        let err = Document::parse("<module><title>x</title>").unwrap_err();
        assert!(matches!(err, XmlError::UnclosedElement(ref n) if n == "module"));
    }

    #[test]
    fn test_empty_and_multiple_roots_rejected() {
        assert!(matches!(Document::parse("  "), Err(XmlError::NoRoot)));
        assert!(matches!(
            Document::parse("<a/><b/>"),
            Err(XmlError::MultipleRoots(_))
        ));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        assert!(Document::parse(r#"<a x="1" x="2"/>"#).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| {
            format!("<module>{}{}</module>", "<a>".repeat(depth), "</a>".repeat(depth))
        };
        // The root counts as one level.
        assert!(XmlParser::new(&nested(MAX_DEPTH - 1)).parse().is_ok());
        let err = XmlParser::new(&nested(MAX_DEPTH)).parse().unwrap_err();
        assert!(matches!(
            err,
            XmlError::TooDeep { ref name, limit } if name == "a" && limit == MAX_DEPTH
        ));
        assert!(matches!(
            XmlParser::new(&nested(50_000)).parse(),
            Err(XmlError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_declared_latin1_encoding() {
        let bytes: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <module label=\"R\xE9f\"><title>R\xE9sistance</title></module>";
        let doc = XmlParser::from_bytes(bytes).parse().unwrap();
        assert_eq!(doc.root().attr("label"), Some("R\u{e9}f"));
        assert_eq!(
            doc.root().child("title").unwrap().text.as_deref(),
            Some("R\u{e9}sistance")
        );
    }

    #[test]
    fn test_undeclared_encoding_must_be_utf8() {
        assert!(XmlParser::from_bytes(b"<module><title>R\xE9</title></module>")
            .parse()
            .is_err());
        let doc = XmlParser::from_bytes("<module><title>R\u{e9}</title></module>".as_bytes())
            .parse()
            .unwrap();
        assert_eq!(doc.root().child("title").unwrap().text.as_deref(), Some("R\u{e9}"));
    }

    #[test]
    fn test_path_to() {
        let svg = r#"<svg><g id="layer"><g><rect id="pin"/></g></g><rect id="other"/></svg>"#;
        let doc = Document::parse(svg).unwrap();
        let path = doc.root().path_to(&|e| e.id() == Some("pin")).unwrap();
        let names: Vec<_> = path.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["svg", "g", "g", "rect"]);
        assert!(doc.root().path_to(&|e| e.id() == Some("missing")).is_none());
    }

    #[test]
    fn test_walk_reports_paths() {
        let doc = Document::parse(r#"<a><b><c/></b><d/></a>"#).unwrap();
        let mut seen = Vec::new();
        doc.root().walk(&mut |path| {
            let names: Vec<_> = path.iter().map(|e| e.name.as_str()).collect();
            seen.push(names.join("/"));
        });
        assert_eq!(seen, vec!["a", "a/b", "a/b/c", "a/d"]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = Document::parse(r#"<a id="1"><b id="2"><c id="3"/></b><d id="4"/></a>"#).unwrap();
        let ids: Vec<_> = doc.descendants().filter_map(|e| e.id()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }
}
