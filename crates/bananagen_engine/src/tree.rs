//! Minimal XML-to-tree parser on top of `quick-xml`.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

use crate::markup::MarkupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub nodes: Vec<XmlNode>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            nodes: Vec::new(),
        }
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.nodes.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children().filter(move |el| el.name == name)
    }

    /// All descendant text in document order, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    fn push_text(&mut self, text: String) {
        if let Some(XmlNode::Text(last)) = self.nodes.last_mut() {
            last.push_str(&text);
        } else {
            self.nodes.push(XmlNode::Text(text));
        }
    }
}

/// Parses `document` and returns its top-level elements.
///
/// Text outside any element, comments, declarations and processing
/// instructions are dropped.
pub fn parse_tree(document: &str) -> Result<Vec<XmlElement>, MarkupError> {
    let mut reader = Reader::from_str(document);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut roots = Vec::new();

    loop {
        let event = reader.read_event().map_err(|err| {
            MarkupError::InvalidXml(format!("{err} at byte {}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(XmlElement::new(name));
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                attach(&mut stack, &mut roots, XmlElement::new(name));
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let element = match stack.pop() {
                    Some(el) if el.name == name => el,
                    Some(el) => {
                        return Err(MarkupError::InvalidXml(format!(
                            "expected </{}>, found </{name}>",
                            el.name
                        )))
                    }
                    None => {
                        return Err(MarkupError::InvalidXml(format!(
                            "unexpected closing tag </{name}>"
                        )))
                    }
                };
                attach(&mut stack, &mut roots, element);
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(decode_text(&text));
                }
            }
            Event::CData(cdata) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(String::from_utf8_lossy(&cdata.into_inner()).into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.last() {
        Some(open) => Err(MarkupError::InvalidXml(format!("unclosed <{}>", open.name))),
        None => Ok(roots),
    }
}

fn attach(stack: &mut [XmlElement], roots: &mut Vec<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.nodes.push(XmlNode::Element(element)),
        None => roots.push(element),
    }
}

/// Models write bare `&` in prose. When strict unescaping fails, references
/// are decoded one at a time and any `&` that starts none is kept as is.
fn decode_text(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(cow) => cow.into_owned(),
        Err(_) => decode_lenient(&String::from_utf8_lossy(text)),
    }
}

fn decode_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .and_then(|end| resolve_reference(&after[..end]).map(|text| (text, end)));
        match decoded {
            Some((text, end)) => {
                out.push_str(&text);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// `name` is the text between `&` and `;`.
fn resolve_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}
