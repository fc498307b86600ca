//! CSV/TSV parsing.
//!
//! A hand-rolled, line-oriented quote state machine rather than a full
//! RFC-4180 reader: records are physical lines, so a quoted field cannot
//! contain an embedded newline. That limitation is load-bearing. Error
//! rows carry on-disk line numbers, and a grammar-level reader would
//! renumber them.

use std::io::{BufRead, BufReader, Read};

use crate::cancel::CancelToken;
use crate::encoding::{self, DecodingReader};
use crate::error::{IngestError, IngestResult};
use crate::types::{Columns, ImportOptions, ParsedRow, Value};

use super::{RowParser, RowStream};

/// Parser for delimiter-separated text (CSV and TSV).
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvParser;

impl RowParser for CsvParser {
    fn parse<'r>(
        &self,
        input: &'r mut dyn Read,
        options: &ImportOptions,
        cancel: CancelToken,
    ) -> RowStream<'r> {
        let enc = encoding::resolve(options.encoding.as_deref());
        Box::new(CsvRows {
            lines: BufReader::new(DecodingReader::new(input, enc)),
            options: options.clone(),
            cancel,
            header: None,
            primed: false,
            line_number: 0,
            done: false,
        })
    }
}

struct CsvRows<'r> {
    lines: BufReader<DecodingReader<'r>>,
    options: ImportOptions,
    cancel: CancelToken,
    header: Option<Vec<String>>,
    primed: bool,
    line_number: u64,
    done: bool,
}

impl CsvRows<'_> {
    fn read_line(&mut self) -> IngestResult<Option<String>> {
        let mut buf = String::new();
        if self.lines.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }

    /// Discard `skip_rows` lines, then consume the header line if any.
    fn prime(&mut self) -> IngestResult<()> {
        for _ in 0..self.options.skip_rows {
            if self.read_line()?.is_none() {
                return Ok(());
            }
        }
        if self.options.has_header {
            if let Some(line) = self.read_line()? {
                let line = self.maybe_trim(line);
                let names = match split_fields(&line, self.options.delimiter, self.options.quote_char)
                {
                    Ok(fields) => fields,
                    // A header the quote machine rejects still has to name
                    // columns; fall back to a naive split.
                    Err(_) => line
                        .split(self.options.delimiter)
                        .map(str::to_string)
                        .collect(),
                };
                let names = if self.options.trim_whitespace {
                    names.into_iter().map(|n| n.trim().to_string()).collect()
                } else {
                    names
                };
                self.header = Some(names);
            }
        }
        Ok(())
    }

    fn maybe_trim(&self, line: String) -> String {
        if self.options.trim_whitespace {
            line.trim().to_string()
        } else {
            line
        }
    }

    fn field_value(&self, raw: String) -> Value {
        let s = if self.options.trim_whitespace {
            raw.trim().to_string()
        } else {
            raw
        };
        match &self.options.null_value {
            Some(sentinel) if s == *sentinel => Value::Null,
            _ => Value::Utf8(s),
        }
    }

    fn row_from_fields(&self, fields: Vec<String>) -> ParsedRow {
        let mut columns = Columns::new();
        match &self.header {
            Some(names) => {
                // Short rows pad with empty fields; extra fields keep
                // their data under synthesized positional names.
                for (i, name) in names.iter().enumerate() {
                    let raw = fields.get(i).cloned().unwrap_or_default();
                    columns.insert(name.clone(), self.field_value(raw));
                }
                for (i, raw) in fields.into_iter().enumerate().skip(names.len()) {
                    columns.insert(format!("Col{}", i + 1), self.field_value(raw));
                }
            }
            None => {
                for (i, raw) in fields.into_iter().enumerate() {
                    columns.insert(format!("Col{}", i + 1), self.field_value(raw));
                }
            }
        }
        ParsedRow::data(self.line_number, columns)
    }
}

impl Iterator for CsvRows<'_> {
    type Item = IngestResult<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(IngestError::Cancelled));
        }
        if !self.primed {
            self.primed = true;
            if let Err(err) = self.prime() {
                self.done = true;
                return Some(Err(err));
            }
        }
        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            // Physical count: blank lines yield no row but still consume
            // a number, keeping error rows on their on-disk lines.
            self.line_number += 1;
            let line = self.maybe_trim(line);
            if line.is_empty() {
                continue;
            }
            let row = match split_fields(&line, self.options.delimiter, self.options.quote_char) {
                Ok(fields) => self.row_from_fields(fields),
                Err(message) => ParsedRow::error(self.line_number, message),
            };
            return Some(Ok(row));
        }
    }
}

/// Split one line into fields with the quote state machine.
///
/// Outside quotes: a quote at field start enters quoted mode, the
/// delimiter ends the field, anything else appends. Inside quotes: a
/// doubled quote appends one literal quote, a single quote exits, all
/// else appends verbatim (delimiters included). A quote still open at
/// end of line is the one malformed-record case.
fn split_fields(line: &str, delimiter: char, quote: char) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == quote {
                if chars.peek() == Some(&quote) {
                    field.push(quote);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == quote && field.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return Err(format!(
            "unterminated quoted value in field {}",
            fields.len() + 1
        ));
    }
    fields.push(field);
    Ok(fields)
}
