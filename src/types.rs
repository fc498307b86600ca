//! Core data model types for row ingestion.
//!
//! Parsers convert every supported format into the same shape: a lazy
//! sequence of [`ParsedRow`]s, each holding an insertion-ordered map of
//! column name to typed [`Value`]. [`ImportOptions`] is the whole
//! caller-facing configuration surface and carries no behavior.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single typed column value in a [`ParsedRow`].
///
/// The set of kinds is deliberately closed so downstream hashing and
/// display logic can match exhaustively. Structurally nested source
/// values (JSON arrays/objects, XML subtrees, YAML sequences/mappings)
/// are re-serialized to text and stored as [`Value::Utf8`] rather than
/// expanded into columns.
///
/// Serializes untagged, so a row renders as plain JSON
/// (`null`/`true`/`1`/`"text"`) for preview endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value or matched null sentinel.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// Integral value above `i64::MAX`.
    UInt64(u64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string, including re-serialized nested structures.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Insertion-ordered column map produced for one record.
pub type Columns = IndexMap<String, Value>;

/// One logical record extracted from a source document.
///
/// A row is either a data row (`parse_error` is `None`, `columns`
/// populated) or an error row (`parse_error` set, `columns` empty),
/// never both. Use [`ParsedRow::data`] / [`ParsedRow::error`] to keep
/// that invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRow {
    /// 1-based position in the logical record sequence (CSV physical line
    /// post-header-skip, JSON array index, XML node index, YAML list
    /// index). Always set, including on error rows.
    pub line_number: u64,
    /// Column name → value, in source order. Column sets may vary
    /// row-to-row; no fixed schema is enforced.
    pub columns: Columns,
    /// Set when this single record failed to parse. The row is still
    /// yielded so the surrounding stream keeps flowing.
    pub parse_error: Option<String>,
    /// Consumer-side flag for filtered rows. Parsers always produce
    /// `false`.
    pub is_skipped: bool,
}

impl ParsedRow {
    /// Create a data row.
    pub fn data(line_number: u64, columns: Columns) -> Self {
        Self {
            line_number,
            columns,
            parse_error: None,
            is_skipped: false,
        }
    }

    /// Create an error row for a record that failed to parse.
    pub fn error(line_number: u64, message: impl Into<String>) -> Self {
        Self {
            line_number,
            columns: Columns::new(),
            parse_error: Some(message.into()),
            is_skipped: false,
        }
    }

    /// Returns `true` when this row represents a parse failure.
    pub fn is_error(&self) -> bool {
        self.parse_error.is_some()
    }

    /// Flag this row as filtered out by a consumer.
    pub fn mark_skipped(&mut self) {
        self.is_skipped = true;
    }
}

/// Caller-supplied format configuration, immutable for one parse.
///
/// Deserializes with per-field defaults so upstream profile/connection
/// metadata can carry partial configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// CSV field delimiter. TSV callers set `'\t'` here; the format name
    /// does not change it.
    pub delimiter: char,
    /// CSV quote character.
    pub quote_char: char,
    /// WHATWG encoding label (`"utf-8"`, `"windows-1252"`, ...). `None`
    /// or an unrecognized label falls back to UTF-8. A leading BOM is
    /// consumed, never emitted into data.
    pub encoding: Option<String>,
    /// Whether the first CSV line (after `skip_rows`) names the columns.
    /// Without a header, columns are named `Col1..ColN`.
    pub has_header: bool,
    /// CSV lines discarded before parsing begins, not counted as data.
    pub skip_rows: usize,
    /// Trim every CSV line and field, and XML text values.
    pub trim_whitespace: bool,
    /// Exact-match null sentinel for text-sourced fields (CSV fields,
    /// XML text and attributes). A field equal to this literal becomes
    /// [`Value::Null`] instead of the literal string.
    pub null_value: Option<String>,
    /// Newline-delimited-document mode for the JSON parser.
    pub json_lines: bool,
    /// Dot-separated path (optionally `$`-prefixed) locating the record
    /// array/object inside a larger JSON or YAML document. Traverses
    /// object/mapping keys only.
    pub data_root_path: Option<String>,
    /// Slash-separated element path selecting XML record nodes. Unset
    /// means "all direct children of the document element".
    pub record_element: Option<String>,
    /// Namespace URI. When set, every XML path step matches only
    /// elements bound to this URI. The prefix is internal; callers only
    /// supply the URI.
    pub xml_namespace: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            encoding: None,
            has_header: true,
            skip_rows: 0,
            trim_whitespace: false,
            null_value: None,
            json_lines: false,
            data_root_path: None,
            record_element: None,
            xml_namespace: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_constructors_keep_error_invariant() {
        let mut columns = Columns::new();
        columns.insert("id".to_string(), Value::Int64(1));
        let data = ParsedRow::data(3, columns);
        assert!(!data.is_error());
        assert_eq!(data.line_number, 3);

        let err = ParsedRow::error(7, "bad record");
        assert!(err.is_error());
        assert!(err.columns.is_empty());
        assert_eq!(err.line_number, 7);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ImportOptions =
            serde_json::from_str(r#"{"delimiter":"\t","null_value":"NULL"}"#).unwrap();
        assert_eq!(options.delimiter, '\t');
        assert_eq!(options.null_value.as_deref(), Some("NULL"));
        assert_eq!(options.quote_char, '"');
        assert!(options.has_header);
        assert!(!options.json_lines);
    }

    #[test]
    fn value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Bool(true),
            Value::Int64(-3),
            Value::Utf8("x".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,true,-3,"x"]"#);
    }
}
