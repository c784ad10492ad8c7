//! Minimal namespace-aware XML element tree.
//!
//! NF-e documents are small (a few hundred kilobytes at most), so the whole
//! document is loaded into a tree and queried by namespace URI and local
//! name, the same way `getElementsByTagNameNS` works on a DOM: descendant
//! search in document order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::{NfeError, Result};

/// Deepest element nesting accepted by [`XmlDocument::parse`].
///
/// Tree walks recurse once per level, so deeper input is rejected up front.
pub const MAX_DEPTH: usize = 256;

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(ns: ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Self> {
        let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let namespace = match ns {
            ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(NfeError::Parse(format!(
                    "namespace prefix '{}' is not bound (element <{}>)",
                    String::from_utf8_lossy(&prefix),
                    local_name
                )));
            }
        };

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            local_name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Namespace URI the element belongs to, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Tag name without prefix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace() == Some(namespace)
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First descendant (not including `self`) matching namespace and local name.
    pub fn find_first(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.is(namespace, local_name) {
                return Some(child);
            }
            if let Some(found) = child.find_first(namespace, local_name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants matching namespace and local name, in document order.
    pub fn find_all(&self, namespace: &str, local_name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_matching(namespace, local_name, &mut found);
        found
    }

    fn collect_matching<'a>(&'a self, namespace: &str, local_name: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.is(namespace, local_name) {
                out.push(child);
            }
            child.collect_matching(namespace, local_name, out);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.append_text(&mut text);
        text
    }

    fn append_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.append_text(out),
            }
        }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    /// Parse a document, rejecting anything that is not well-formed.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(start) => {
                    if open.is_empty() && root.is_some() {
                        return Err(extra_content_error());
                    }
                    check_depth(open.len() + 1)?;
                    open.push(Element::from_start(ns, &start)?);
                }
                Event::Empty(start) => {
                    check_depth(open.len() + 1)?;
                    let element = Element::from_start(ns, &start)?;
                    close_element(element, &mut open, &mut root)?;
                }
                Event::End(_) => {
                    let element = open
                        .pop()
                        .ok_or_else(|| NfeError::Parse("unexpected closing tag".to_string()))?;
                    close_element(element, &mut open, &mut root)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    push_text(text.into_owned(), &mut open)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    push_text(text, &mut open)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(NfeError::Parse(format!(
                "unexpected end of document, <{}> is not closed",
                unclosed.local_name
            )));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| NfeError::Parse("document has no root element".to_string()))
    }

    /// The document element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// First element in document order, root included, matching namespace
    /// and local name.
    pub fn find_first(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        if self.root.is(namespace, local_name) {
            Some(&self.root)
        } else {
            self.root.find_first(namespace, local_name)
        }
    }
}

fn close_element(element: Element, open: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(extra_content_error()),
    }
    Ok(())
}

fn push_text(text: String, open: &mut [Element]) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Text(text)),
        None if text.trim().is_empty() => {}
        None => {
            return Err(NfeError::Parse(
                "text content outside of the root element".to_string(),
            ));
        }
    }
    Ok(())
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(NfeError::Parse("maximum nesting depth exceeded".to_string()));
    }
    Ok(())
}

fn extra_content_error() -> NfeError {
    NfeError::Parse("extra content after the root element".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NS: &str = "urn:test";

    #[test]
    fn test_prefixed_and_default_namespace_resolve_alike() {
        let doc = XmlDocument::parse(
            r#"<x:a xmlns:x="urn:test"><x:b>one</x:b><b xmlns="urn:test">two</b></x:a>"#,
        )
        .unwrap();

        let all: Vec<_> = doc.root().find_all(NS, "b").iter().map(|b| b.text()).collect();
        assert_eq!(all, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_other_namespace_does_not_match() {
        let doc = XmlDocument::parse(
            r#"<a xmlns="urn:test"><b xmlns="urn:other">no</b><b>yes</b></a>"#,
        )
        .unwrap();

        assert_eq!(doc.root().find_first(NS, "b").unwrap().text(), "yes");
        assert!(doc.root().find_first("urn:other", "c").is_none());
    }

    #[test]
    fn test_find_first_is_document_order() {
        let doc = XmlDocument::parse(
            r#"<a xmlns="urn:test"><p><c>deep</c></p><c>shallow</c></a>"#,
        )
        .unwrap();

        assert_eq!(doc.root().find_first(NS, "c").unwrap().text(), "deep");
    }

    #[test]
    fn test_document_find_includes_root() {
        let doc = XmlDocument::parse(r#"<a xmlns="urn:test" Id="x"/>"#).unwrap();
        assert_eq!(doc.find_first(NS, "a").unwrap().attribute("Id"), Some("x"));
        assert!(doc.root().find_first(NS, "a").is_none());
    }

    #[test]
    fn test_text_unescapes_entities_and_cdata() {
        let doc = XmlDocument::parse(
            r#"<a>A &amp; B<![CDATA[ <raw> ]]><i>!</i></a>"#,
        )
        .unwrap();
        assert_eq!(doc.root().text(), "A & B <raw> !");
    }

    #[test]
    fn test_rejects_mismatched_tags() {
        let err = XmlDocument::parse("<a><b></a></b>").unwrap_err();
        assert!(matches!(err, NfeError::Parse(_)));
    }

    #[test]
    fn test_rejects_truncated_document() {
        let err = XmlDocument::parse("<a><b>text</b>").unwrap_err();
        assert!(err.to_string().contains("<a> is not closed"));
    }

    #[test]
    fn test_rejects_empty_and_plain_text() {
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("not xml at all").is_err());
    }

    #[test]
    fn test_rejects_second_root() {
        let err = XmlDocument::parse("<a/><b/>").unwrap_err();
        assert!(err.to_string().contains("extra content"));
    }

    #[test]
    fn test_rejects_unbound_prefix() {
        let err = XmlDocument::parse("<x:a/>").unwrap_err();
        assert!(err.to_string().contains("not bound"));
    }

    fn nested(depth: usize, leaf: &str) -> String {
        format!("{}{}{}", "<x>".repeat(depth), leaf, "</x>".repeat(depth))
    }

    #[test]
    fn test_accepts_nesting_up_to_limit() {
        let doc = XmlDocument::parse(&nested(MAX_DEPTH, "ok")).unwrap();
        assert_eq!(doc.root().text(), "ok");

        assert!(XmlDocument::parse(&nested(MAX_DEPTH - 1, "<y/>")).is_ok());
    }

    #[test]
    fn test_rejects_nesting_past_limit() {
        let err = XmlDocument::parse(&nested(MAX_DEPTH + 1, "")).unwrap_err();
        assert_eq!(err.to_string(), "XML parse error: maximum nesting depth exceeded");

        let err = XmlDocument::parse(&nested(MAX_DEPTH, "<y/>")).unwrap_err();
        assert!(err.to_string().contains("maximum nesting depth"));

        assert!(XmlDocument::parse(&nested(10_000, "")).is_err());
    }

    #[test]
    fn test_rejects_unknown_entity() {
        assert!(XmlDocument::parse("<a>&bogus;</a>").is_err());
    }
}
