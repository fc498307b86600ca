//! XML parsing.
//!
//! The whole document is read into an element tree before any row is
//! produced; the memory cost is an accepted tradeoff for keeping record
//! selection a plain tree walk. Record nodes are chosen by a minimal
//! slash-separated path (no wildcards, predicates or indices), optionally
//! qualified by a namespace URI.

use std::io::Read;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::cancel::CancelToken;
use crate::encoding::{self, DecodingReader};
use crate::error::{IngestError, IngestResult};
use crate::types::{Columns, ImportOptions, ParsedRow, Value};

use super::{RowParser, RowStream, document_error, io_failure};

/// Parser for XML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlParser;

impl RowParser for XmlParser {
    fn parse<'r>(
        &self,
        input: &'r mut dyn Read,
        options: &ImportOptions,
        cancel: CancelToken,
    ) -> RowStream<'r> {
        let enc = encoding::resolve(options.encoding.as_deref());
        let mut text = String::new();
        if let Err(err) = DecodingReader::new(input, enc).read_to_string(&mut text) {
            return io_failure(err);
        }
        let root = match build_tree(&text) {
            Ok(root) => root,
            Err(message) => return document_error(1, format!("invalid xml document: {message}")),
        };
        let records = match select_records(
            root,
            options.record_element.as_deref(),
            options.xml_namespace.as_deref(),
        ) {
            Ok(records) => records,
            Err(message) => return document_error(1, message),
        };
        Box::new(XmlRows {
            nodes: records.into_iter(),
            options: options.clone(),
            index: 0,
            cancel,
            done: false,
        })
    }
}

#[derive(Debug, Clone)]
struct XmlElement {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    fn has_element_children(&self) -> bool {
        !self.children.is_empty()
    }
}

fn build_tree(text: &str) -> Result<XmlElement, String> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(start))) => {
                stack.push(element_from_start(ns, &start)?);
            }
            Ok((ns, Event::Empty(start))) => {
                let element = element_from_start(ns, &start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::End(_))) => {
                let element = stack.pop().ok_or_else(|| "unbalanced end tag".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::Text(t))) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok((_, Event::CData(t))) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {} // declaration, comments, processing instructions
            Err(err) => return Err(err.to_string()),
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err("multiple root elements".to_string());
            }
            *root = Some(element);
        }
    }
    Ok(())
}

fn element_from_start(ns: ResolveResult, start: &BytesStart) -> Result<XmlElement, String> {
    let namespace = match ns {
        ResolveResult::Bound(n) => Some(String::from_utf8_lossy(n.into_inner()).into_owned()),
        _ => None,
    };
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        namespace,
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Evaluate the record path. No expression selects all direct children
/// of the document element; otherwise the first segment names the
/// document element and the rest descend. A path matching nothing is a
/// legitimate zero-row result, not an error.
fn select_records(
    root: XmlElement,
    path: Option<&str>,
    namespace: Option<&str>,
) -> Result<Vec<XmlElement>, String> {
    let Some(expr) = path else {
        return Ok(root.children);
    };
    let segments: Vec<&str> = expr.trim().split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err("record element path is empty".to_string());
    }
    if !matches(&root, segments[0], namespace) {
        return Ok(Vec::new());
    }
    let mut current = vec![root];
    for segment in &segments[1..] {
        let mut next = Vec::new();
        for node in current {
            for child in node.children {
                if matches(&child, segment, namespace) {
                    next.push(child);
                }
            }
        }
        current = next;
    }
    Ok(current)
}

fn matches(element: &XmlElement, name: &str, namespace: Option<&str>) -> bool {
    element.name == name
        && match namespace {
            Some(uri) => element.namespace.as_deref() == Some(uri),
            None => true,
        }
}

struct XmlRows {
    nodes: std::vec::IntoIter<XmlElement>,
    options: ImportOptions,
    index: u64,
    cancel: CancelToken,
    done: bool,
}

impl Iterator for XmlRows {
    type Item = IngestResult<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(IngestError::Cancelled));
        }
        let node = self.nodes.next()?;
        self.index += 1;
        Some(Ok(element_to_row(self.index, &node, &self.options)))
    }
}

/// Attributes become `@name` columns; leaf children contribute their
/// text, children with element children contribute raw outer XML; a bare
/// node with neither synthesizes a single `value` column.
fn element_to_row(index: u64, element: &XmlElement, options: &ImportOptions) -> ParsedRow {
    let mut columns = Columns::new();
    for (name, value) in &element.attributes {
        columns.insert(format!("@{name}"), text_value(value, options));
    }
    for child in &element.children {
        let value = if child.has_element_children() {
            Value::Utf8(outer_xml(child))
        } else {
            text_value(&child.text, options)
        };
        columns.insert(child.name.clone(), value);
    }
    if columns.is_empty() {
        columns.insert("value".to_string(), text_value(&element.text, options));
    }
    ParsedRow::data(index, columns)
}

fn text_value(raw: &str, options: &ImportOptions) -> Value {
    let s = if options.trim_whitespace {
        raw.trim()
    } else {
        raw
    };
    match options.null_value.as_deref() {
        Some(sentinel) if s == sentinel => Value::Null,
        _ => Value::Utf8(s.to_string()),
    }
}

fn outer_xml(element: &XmlElement) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

fn write_element(element: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_text(value));
        out.push('"');
    }
    if element.children.is_empty() && element.text.trim().is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if element.children.is_empty() {
        out.push_str(&escape_text(&element.text));
    }
    for child in &element.children {
        write_element(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::{build_tree, outer_xml, select_records};

    #[test]
    fn tree_captures_names_attributes_and_text() {
        let root = build_tree(r#"<a id="1"><b>x</b><c/></a>"#).unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.attributes, vec![("id".to_string(), "1".to_string())]);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "x");
    }

    #[test]
    fn tree_resolves_namespaces() {
        let root = build_tree(r#"<a xmlns="urn:x"><b>1</b></a>"#).unwrap();
        assert_eq!(root.namespace.as_deref(), Some("urn:x"));
        assert_eq!(root.children[0].namespace.as_deref(), Some("urn:x"));
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(build_tree("<a><b></a>").is_err());
        assert!(build_tree("not xml at all").is_err());
    }

    #[test]
    fn path_selection_descends_from_document_element() {
        let root = build_tree("<cat><book><t>1</t></book><book><t>2</t></book><other/></cat>")
            .unwrap();
        let records = select_records(root, Some("/cat/book"), None).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn non_matching_path_selects_nothing() {
        let root = build_tree("<cat><book/></cat>").unwrap();
        assert!(select_records(root, Some("/dog/book"), None).unwrap().is_empty());
    }

    #[test]
    fn blank_path_is_an_error() {
        let root = build_tree("<cat/>").unwrap();
        assert!(select_records(root, Some("  / "), None).is_err());
    }

    #[test]
    fn outer_xml_round_trips_structure() {
        let root = build_tree(r#"<a id="1"><b>x &amp; y</b></a>"#).unwrap();
        assert_eq!(outer_xml(&root), r#"<a id="1"><b>x &amp; y</b></a>"#);
    }
}
