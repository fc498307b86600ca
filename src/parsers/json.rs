//! JSON and newline-delimited JSON parsing.
//!
//! Two independent paths. Document mode reads the whole stream as one
//! JSON value, optionally navigates a dot path to the record collection,
//! and requires an array or object there. Line-delimited mode parses one
//! value per physical line, which is what gives it per-record fault
//! isolation; in document mode there is only one document to lose.

use std::io::{BufRead, BufReader, Read};

use serde_json::Value as JsonValue;

use crate::cancel::CancelToken;
use crate::encoding::{self, DecodingReader};
use crate::error::{IngestError, IngestResult};
use crate::types::{Columns, ImportOptions, ParsedRow, Value};

use super::{RowParser, RowStream, document_error, io_failure};

/// Parser for JSON documents and newline-delimited JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl RowParser for JsonParser {
    fn parse<'r>(
        &self,
        input: &'r mut dyn Read,
        options: &ImportOptions,
        cancel: CancelToken,
    ) -> RowStream<'r> {
        let enc = encoding::resolve(options.encoding.as_deref());
        if options.json_lines {
            return Box::new(JsonLines {
                lines: BufReader::new(DecodingReader::new(input, enc)),
                cancel,
                line_number: 0,
                done: false,
            });
        }

        let mut text = String::new();
        if let Err(err) = DecodingReader::new(input, enc).read_to_string(&mut text) {
            return io_failure(err);
        }
        let doc: JsonValue = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => return document_error(1, format!("invalid json document: {err}")),
        };
        let root = match resolve_root(doc, options.data_root_path.as_deref()) {
            Ok(value) => value,
            Err(message) => return document_error(1, message),
        };
        match root {
            JsonValue::Array(items) => Box::new(DocRows {
                items: items.into_iter(),
                index: 0,
                cancel,
                done: false,
            }),
            object @ JsonValue::Object(_) => Box::new(DocRows {
                items: vec![object].into_iter(),
                index: 0,
                cancel,
                done: false,
            }),
            other => document_error(
                1,
                format!(
                    "data root must be an array or an object, found {}",
                    kind_name(&other)
                ),
            ),
        }
    }
}

/// Rows drawn one at a time from a parsed document's record collection.
struct DocRows {
    items: std::vec::IntoIter<JsonValue>,
    index: u64,
    cancel: CancelToken,
    done: bool,
}

impl Iterator for DocRows {
    type Item = IngestResult<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(IngestError::Cancelled));
        }
        let value = self.items.next()?;
        self.index += 1;
        Some(Ok(value_to_row(self.index, value)))
    }
}

/// One independent JSON value per physical line; blank lines are skipped
/// but still numbered.
struct JsonLines<'r> {
    lines: BufReader<DecodingReader<'r>>,
    cancel: CancelToken,
    line_number: u64,
    done: bool,
}

impl Iterator for JsonLines<'_> {
    type Item = IngestResult<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(IngestError::Cancelled));
        }
        loop {
            let mut buf = String::new();
            match self.lines.read_line(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line_number += 1;
                    let line = buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let row = match serde_json::from_str::<JsonValue>(line) {
                        Ok(value) => value_to_row(self.line_number, value),
                        Err(err) => {
                            ParsedRow::error(self.line_number, format!("invalid json line: {err}"))
                        }
                    };
                    return Some(Ok(row));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(IngestError::Io(err)));
                }
            }
        }
    }
}

/// Navigate a dot path (optionally `$`-prefixed) through object
/// properties only. Arrays cannot appear mid-path.
fn resolve_root(doc: JsonValue, path: Option<&str>) -> Result<JsonValue, String> {
    let Some(path) = path else { return Ok(doc) };
    let path = path.trim();
    let path = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix('$'))
        .unwrap_or(path);
    if path.is_empty() {
        return Ok(doc);
    }
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            JsonValue::Object(mut map) => map
                .remove(segment)
                .ok_or_else(|| format!("data root path segment '{segment}' not found"))?,
            other => {
                return Err(format!(
                    "data root path segment '{segment}' cannot traverse {}",
                    kind_name(&other)
                ));
            }
        };
    }
    Ok(current)
}

fn value_to_row(line_number: u64, value: JsonValue) -> ParsedRow {
    let mut columns = Columns::new();
    match value {
        JsonValue::Object(map) => {
            for (name, v) in map {
                columns.insert(name, convert(v));
            }
        }
        // Scalar and array records keep their value under one column.
        other => {
            columns.insert("value".to_string(), convert(other));
        }
    }
    ParsedRow::data(line_number, columns)
}

/// Scalars pass through; numbers take the i64 → u64 → f64 ladder;
/// arrays/objects re-serialize to raw JSON text.
fn convert(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else {
                Value::Float64(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => Value::Utf8(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Utf8(nested.to_string()),
    }
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{convert, resolve_root};
    use crate::types::Value;

    #[test]
    fn root_path_traverses_objects() {
        let doc = json!({"data": {"items": [1, 2]}});
        let resolved = resolve_root(doc, Some("data.items")).unwrap();
        assert_eq!(resolved, json!([1, 2]));
    }

    #[test]
    fn root_path_strips_dollar_prefix() {
        let doc = json!({"data": {"items": []}});
        assert!(resolve_root(doc.clone(), Some("$.data.items")).is_ok());
        assert!(resolve_root(doc, Some("$")).is_ok());
    }

    #[test]
    fn root_path_rejects_missing_segment() {
        let doc = json!({"data": {}});
        let err = resolve_root(doc, Some("data.items")).unwrap_err();
        assert!(err.contains("'items' not found"));
    }

    #[test]
    fn root_path_rejects_arrays_mid_path() {
        let doc = json!({"data": [{"items": []}]});
        let err = resolve_root(doc, Some("data.items")).unwrap_err();
        assert!(err.contains("cannot traverse an array"));
    }

    #[test]
    fn numbers_take_the_integer_first_ladder() {
        assert_eq!(convert(json!(7)), Value::Int64(7));
        assert_eq!(convert(json!(-7)), Value::Int64(-7));
        assert_eq!(
            convert(json!(9_223_372_036_854_775_808_u64)),
            Value::UInt64(9_223_372_036_854_775_808)
        );
        assert_eq!(convert(json!(1.5)), Value::Float64(1.5));
    }

    #[test]
    fn nested_values_reserialize_to_raw_json() {
        assert_eq!(
            convert(json!({"a": [1, 2]})),
            Value::Utf8(r#"{"a":[1,2]}"#.to_string())
        );
    }
}
