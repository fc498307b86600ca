//! Format parsers and the format-selection factory.
//!
//! The four parsers are independent of one another; they share only the
//! data model and this module's [`RowParser`] contract. [`parser_for`]
//! is the single dispatch point from a caller-supplied format name.

pub mod csv;
pub mod json;
pub mod xml;
pub mod yaml;

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{IngestError, IngestResult};
use crate::types::{ImportOptions, ParsedRow};

pub use csv::CsvParser;
pub use json::JsonParser;
pub use xml::XmlParser;
pub use yaml::YamlParser;

/// Lazy, single-pass, forward-only row sequence produced by a
/// [`RowParser`]. Restartable only by re-invoking the parser on a fresh
/// stream.
pub type RowStream<'r> = Box<dyn Iterator<Item = IngestResult<ParsedRow>> + 'r>;

/// Capability interface shared by the four format parsers.
///
/// Contract:
/// - The stream is borrowed, read forward once, and never closed; the
///   caller owns its lifetime (seekable re-reads, quota wrappers, tests).
/// - A malformed individual record yields one error row and parsing
///   continues. A malformed document yields exactly one error row and
///   the sequence ends.
/// - The cancellation token is checked between rows; once fired the
///   stream yields [`IngestError::Cancelled`] and ends. Cancellation is
///   never reported as a row `parse_error`.
/// - Two parses over two streams are fully independent; one stream is
///   not for concurrent consumption.
pub trait RowParser: Send + Sync + std::fmt::Debug {
    /// Produce the lazy row sequence for `input` under `options`.
    fn parse<'r>(
        &self,
        input: &'r mut dyn Read,
        options: &ImportOptions,
        cancel: CancelToken,
    ) -> RowStream<'r>;
}

/// Supported import formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportFormat {
    /// Delimiter-separated text (`CSV`, `TSV`).
    Csv,
    /// JSON document or newline-delimited JSON (`JSON`, `JSONL`).
    Json,
    /// XML document (`XML`).
    Xml,
    /// YAML document (`YAML`, `YML`).
    Yaml,
}

impl ImportFormat {
    /// Parse a caller-supplied format name, case-insensitively.
    ///
    /// `TSV` selects the CSV parser; the tab delimiter comes from
    /// [`ImportOptions::delimiter`], not the name. `JSONL` selects the
    /// JSON parser; line-delimited mode comes from
    /// [`ImportOptions::json_lines`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Some(Self::Csv),
            "json" | "jsonl" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Look up the parser for a format name.
///
/// Unrecognized names fail here, before any stream is touched, so a
/// misconfigured profile surfaces as a configuration error rather than
/// an ambiguous runtime parse error.
pub fn parser_for(format: &str) -> IngestResult<Box<dyn RowParser>> {
    let fmt = ImportFormat::from_name(format)
        .ok_or_else(|| IngestError::UnsupportedFormat(format.to_string()))?;
    Ok(match fmt {
        ImportFormat::Csv => Box::new(CsvParser),
        ImportFormat::Json => Box::new(JsonParser),
        ImportFormat::Xml => Box::new(XmlParser),
        ImportFormat::Yaml => Box::new(YamlParser),
    })
}

/// A stream holding exactly one document-level error row.
pub(crate) fn document_error<'r>(line: u64, message: String) -> RowStream<'r> {
    Box::new(std::iter::once(Ok(ParsedRow::error(line, message))))
}

/// A stream that surfaces an I/O failure and ends.
pub(crate) fn io_failure<'r>(err: std::io::Error) -> RowStream<'r> {
    Box::new(std::iter::once(Err(IngestError::Io(err))))
}

#[cfg(test)]
mod tests {
    use super::ImportFormat;

    #[test]
    fn format_names_resolve_case_insensitively() {
        assert_eq!(ImportFormat::from_name("CSV"), Some(ImportFormat::Csv));
        assert_eq!(ImportFormat::from_name("tsv"), Some(ImportFormat::Csv));
        assert_eq!(ImportFormat::from_name("Json"), Some(ImportFormat::Json));
        assert_eq!(ImportFormat::from_name("JSONL"), Some(ImportFormat::Json));
        assert_eq!(ImportFormat::from_name("xml"), Some(ImportFormat::Xml));
        assert_eq!(ImportFormat::from_name("YAML"), Some(ImportFormat::Yaml));
        assert_eq!(ImportFormat::from_name("yml"), Some(ImportFormat::Yaml));
        assert_eq!(ImportFormat::from_name("ini"), None);
    }
}
