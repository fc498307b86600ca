//! YAML parsing.
//!
//! The whole stream deserializes once into a generic value graph, then
//! normalizes: an optional dot path locates the record collection, the
//! resolved node must be a sequence or a mapping, and each mapping
//! flattens one level. Nested structures re-serialize to JSON text (not
//! YAML) so every format hands nested data downstream the same way.

use std::io::Read;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::cancel::CancelToken;
use crate::encoding::{self, DecodingReader};
use crate::error::{IngestError, IngestResult};
use crate::types::{Columns, ImportOptions, ParsedRow, Value};

use super::{RowParser, RowStream, document_error, io_failure};

/// Parser for YAML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlParser;

impl RowParser for YamlParser {
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
        if text.trim().is_empty() {
            // Legitimate empty input, not a failure.
            return Box::new(std::iter::empty());
        }
        let doc: YamlValue = match serde_yaml::from_str(&text) {
            Ok(value) => value,
            Err(err) => return document_error(1, format!("invalid yaml document: {err}")),
        };
        let doc = untag(doc);
        if doc.is_null() {
            return Box::new(std::iter::empty());
        }
        let root = match resolve_root(doc, options.data_root_path.as_deref()) {
            Ok(value) => value,
            Err(message) => return document_error(1, message),
        };
        match root {
            YamlValue::Sequence(items) => Box::new(YamlRows {
                items: items.into_iter(),
                index: 0,
                cancel,
                done: false,
            }),
            mapping @ YamlValue::Mapping(_) => Box::new(YamlRows {
                items: vec![mapping].into_iter(),
                index: 0,
                cancel,
                done: false,
            }),
            other => document_error(
                1,
                format!(
                    "data root must be a list or a map, found {}",
                    kind_name(&other)
                ),
            ),
        }
    }
}

struct YamlRows {
    items: std::vec::IntoIter<YamlValue>,
    index: u64,
    cancel: CancelToken,
    done: bool,
}

impl Iterator for YamlRows {
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

/// Navigate a dot path (optionally `$`-prefixed) through mapping keys
/// only. Entering a non-mapping mid-path is a structural error.
fn resolve_root(doc: YamlValue, path: Option<&str>) -> Result<YamlValue, String> {
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
        current = match untag(current) {
            YamlValue::Mapping(map) => {
                let mut found = None;
                for (key, value) in map {
                    if key.as_str() == Some(segment) {
                        found = Some(value);
                        break;
                    }
                }
                found.ok_or_else(|| format!("data root path segment '{segment}' not found"))?
            }
            other => {
                return Err(format!(
                    "data root path segment '{segment}' cannot traverse {}",
                    kind_name(&other)
                ));
            }
        };
    }
    Ok(untag(current))
}

fn value_to_row(index: u64, value: YamlValue) -> ParsedRow {
    let mut columns = Columns::new();
    match untag(value) {
        YamlValue::Mapping(map) => {
            for (key, v) in map {
                let Some(name) = key_name(&key) else {
                    continue;
                };
                columns.insert(name, convert(v));
            }
        }
        // Non-mapping list elements keep their value under one column.
        other => {
            columns.insert("value".to_string(), convert(other));
        }
    }
    ParsedRow::data(index, columns)
}

/// Mapping keys stringify from string, number or bool keys; other key
/// kinds are dropped.
fn key_name(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalars pass through on the i64 → u64 → f64 ladder; sequences and
/// mappings re-serialize to JSON text.
fn convert(value: YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else {
                Value::Float64(n.as_f64().unwrap_or(0.0))
            }
        }
        YamlValue::String(s) => Value::Utf8(s),
        nested @ (YamlValue::Sequence(_) | YamlValue::Mapping(_)) => {
            Value::Utf8(to_json(&nested).to_string())
        }
        YamlValue::Tagged(tagged) => convert(tagged.value),
    }
}

fn to_json(value: &YamlValue) -> JsonValue {
    match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                serde_json::Number::from_f64(n.as_f64().unwrap_or(0.0))
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        YamlValue::String(s) => JsonValue::String(s.clone()),
        YamlValue::Sequence(seq) => JsonValue::Array(seq.iter().map(to_json).collect()),
        YamlValue::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, v) in map {
                if let Some(name) = key_name(key) {
                    object.insert(name, to_json(v));
                }
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => to_json(&tagged.value),
    }
}

fn untag(value: YamlValue) -> YamlValue {
    match value {
        YamlValue::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn kind_name(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a list",
        YamlValue::Mapping(_) => "a map",
        YamlValue::Tagged(_) => "a tagged value",
    }
}
