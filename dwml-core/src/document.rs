//! Navigable element tree over a raw DWML document.
//!
//! This layer only guarantees well-formed XML. Whether the tree actually looks
//! like DWML is left to the aligner.

use std::fmt;

use crate::error::DwmlError;

/// A parsed document borrowing the text it was built from.
pub struct DwmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> DwmlDocument<'input> {
    /// Parse raw document text.
    ///
    /// Fails with [`DwmlError::MalformedDocument`] when the text is not
    /// well-formed XML. No schema checks happen here.
    pub fn parse(text: &'input str) -> Result<Self, DwmlError> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    pub fn root(&self) -> Element<'_, 'input> {
        Element::new(self.doc.root_element())
    }
}

impl fmt::Debug for DwmlDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DwmlDocument")
            .field("root", &self.root().tag())
            .finish()
    }
}

/// Which namespaces a [`Query`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace<'q> {
    Any,
    Unqualified,
    Uri(&'q str),
}

/// Element lookup by local tag name, optionally narrowed by namespace and
/// by the value of one attribute.
#[derive(Debug, Clone, Copy)]
pub struct Query<'q> {
    tag: &'q str,
    namespace: Namespace<'q>,
    attribute: Option<(&'q str, &'q str)>,
}

impl<'q> Query<'q> {
    /// Match elements with this local name in any namespace.
    pub fn tag(tag: &'q str) -> Self {
        Self {
            tag,
            namespace: Namespace::Any,
            attribute: None,
        }
    }

    pub fn in_namespace(mut self, uri: &'q str) -> Self {
        self.namespace = Namespace::Uri(uri);
        self
    }

    pub fn unqualified(mut self) -> Self {
        self.namespace = Namespace::Unqualified;
        self
    }

    /// Only match elements whose `name` attribute equals `value`.
    pub fn with_attribute(mut self, name: &'q str, value: &'q str) -> Self {
        self.attribute = Some((name, value));
        self
    }

    fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }

        let name = node.tag_name();
        if name.name() != self.tag {
            return false;
        }

        let namespace_ok = match self.namespace {
            Namespace::Any => true,
            Namespace::Unqualified => name.namespace().is_none(),
            Namespace::Uri(uri) => name.namespace() == Some(uri),
        };

        namespace_ok
            && self
                .attribute
                .is_none_or(|(attr, value)| node.attribute(attr) == Some(value))
    }
}

/// Lightweight handle to one element of a [`DwmlDocument`].
#[derive(Clone, Copy)]
pub struct Element<'a, 'input: 'a> {
    node: roxmltree::Node<'a, 'input>,
}

impl<'a, 'input: 'a> Element<'a, 'input> {
    fn new(node: roxmltree::Node<'a, 'input>) -> Self {
        Self { node }
    }

    /// Local tag name, without any namespace prefix.
    pub fn tag(&self) -> &'a str {
        self.node.tag_name().name()
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.node.tag_name().namespace()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node.attribute(name)
    }

    /// Trimmed text content; `None` for empty or whitespace-only elements.
    pub fn text(&self) -> Option<&'a str> {
        self.node
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Direct element children with the given local name, in document order.
    pub fn children(self, tag: &str) -> impl Iterator<Item = Element<'a, 'input>> {
        self.node
            .children()
            .filter(move |n| n.is_element() && n.tag_name().name() == tag)
            .map(Element::new)
    }

    /// First descendant (excluding `self`) matching `query`, in document order.
    pub fn find_first(self, query: Query<'_>) -> Option<Element<'a, 'input>> {
        self.find_all(query).next()
    }

    /// All descendants (excluding `self`) matching `query`, in document order.
    pub fn find_all(self, query: Query<'_>) -> impl Iterator<Item = Element<'a, 'input>> {
        self.node
            .descendants()
            .skip(1)
            .filter(move |n| query.matches(*n))
            .map(Element::new)
    }
}

impl fmt::Debug for Element<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag())
            .field("namespace", &self.namespace())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<dwml version="1.0">
  <data>
    <time-layout summarization="none">
      <layout-key>k-p1h-n2-1</layout-key>
      <start-valid-time>2025-05-28T18:00:00-05:00</start-valid-time>
      <start-valid-time>2025-05-28T19:00:00-05:00</start-valid-time>
    </time-layout>
    <parameters applicable-location="point1">
      <temperature type="hourly" units="Fahrenheit" time-layout="k-p1h-n2-1">
        <value> 72 </value>
        <value/>
      </temperature>
      <temperature type="maximum" units="Fahrenheit" time-layout="k-p24h-n7-1">
        <value>88</value>
      </temperature>
    </parameters>
  </data>
</dwml>"#;

    #[test]
    fn malformed_text_is_rejected() {
        let err = DwmlDocument::parse("<dwml><data></dwml>").unwrap_err();
        assert!(matches!(err, DwmlError::MalformedDocument(_)));
    }

    #[test]
    fn find_all_walks_descendants_in_document_order() {
        let doc = DwmlDocument::parse(SAMPLE).expect("sample must parse");
        let types: Vec<_> = doc
            .root()
            .find_all(Query::tag("temperature"))
            .filter_map(|e| e.attribute("type"))
            .collect();

        assert_eq!(types, vec!["hourly", "maximum"]);
    }

    #[test]
    fn attribute_filter_narrows_matches() {
        let doc = DwmlDocument::parse(SAMPLE).expect("sample must parse");
        let found = doc
            .root()
            .find_first(Query::tag("temperature").with_attribute("time-layout", "k-p24h-n7-1"))
            .expect("maximum series must be found");

        assert_eq!(found.attribute("type"), Some("maximum"));
    }

    #[test]
    fn find_all_excludes_the_starting_element() {
        let doc = DwmlDocument::parse(SAMPLE).expect("sample must parse");
        let root = doc.root();

        assert_eq!(root.tag(), "dwml");
        assert!(root.find_first(Query::tag("dwml")).is_none());
    }

    #[test]
    fn text_is_trimmed_and_empty_is_none() {
        let doc = DwmlDocument::parse(SAMPLE).expect("sample must parse");
        let hourly = doc
            .root()
            .find_first(Query::tag("temperature"))
            .expect("temperature must be found");
        let cells: Vec<_> = hourly.children("value").map(|v| v.text()).collect();

        assert_eq!(cells, vec![Some("72"), None]);
    }

    #[test]
    fn namespace_filters() {
        let xml = r#"<root xmlns:d="urn:dwml"><d:value>1</d:value><value>2</value></root>"#;
        let doc = DwmlDocument::parse(xml).expect("must parse");
        let root = doc.root();

        assert_eq!(root.find_all(Query::tag("value")).count(), 2);
        assert_eq!(
            root.find_first(Query::tag("value").in_namespace("urn:dwml"))
                .and_then(|e| e.text()),
            Some("1")
        );
        assert_eq!(
            root.find_first(Query::tag("value").unqualified())
                .and_then(|e| e.text()),
            Some("2")
        );
    }
}
