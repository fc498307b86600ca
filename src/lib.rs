//! `row-ingest` is a small library for streaming externally supplied data
//! files (CSV/TSV, JSON/JSONL, XML, YAML) into a uniform sequence of typed
//! [`types::ParsedRow`]s, so downstream consumers (change-detection
//! hashing, loaders, previewers) handle every format identically.
//!
//! The entrypoint is [`parsers::parser_for`], which maps a caller-supplied
//! format name to one of four independent [`parsers::RowParser`]
//! implementations. A parser borrows a readable byte stream plus an
//! [`types::ImportOptions`] and lazily yields rows until exhaustion or
//! cancellation; it never materializes the whole input, and it never
//! closes the caller's stream.
//!
//! ## Fault isolation
//!
//! A malformed record becomes one error row (`parse_error` set, accurate
//! line number) and parsing continues; a 100,000-row file with 3 bad rows
//! still yields 99,997 good rows. A document that cannot be parsed at all
//! (invalid XML/YAML/whole-JSON) yields exactly one error row and the
//! sequence ends. Unrecognized format names fail at the factory, before
//! any stream is touched.
//!
//! ## Quick example
//!
//! ```
//! use row_ingest::{CancelToken, ImportOptions, parser_for};
//!
//! # fn main() -> Result<(), row_ingest::IngestError> {
//! let parser = parser_for("csv")?;
//! let mut input = "id,name\n1,Ada\n2,Grace\n".as_bytes();
//! let options = ImportOptions::default();
//!
//! for row in parser.parse(&mut input, &options, CancelToken::new()) {
//!     let row = row?;
//!     println!("line {}: {} columns", row.line_number, row.columns.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! JSON and YAML documents can point at a nested record collection with a
//! dot path:
//!
//! ```
//! use row_ingest::{CancelToken, ImportOptions, Value, parser_for};
//!
//! # fn main() -> Result<(), row_ingest::IngestError> {
//! let parser = parser_for("json")?;
//! let mut input = r#"{"data":{"items":[{"a":1},{"a":2}]}}"#.as_bytes();
//! let options = ImportOptions {
//!     data_root_path: Some("data.items".to_string()),
//!     ..Default::default()
//! };
//!
//! let rows: Vec<_> = parser
//!     .parse(&mut input, &options, CancelToken::new())
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].columns["a"], Value::Int64(1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parsers`]: the four format parsers and the format-name factory
//! - [`types`]: row/value/options data model
//! - [`cancel`]: cooperative cancellation token
//! - [`observability`]: observer hooks over a row stream
//! - [`error`]: error types shared across parsing

pub mod cancel;
pub mod error;
pub mod observability;
pub mod parsers;
pub mod types;

mod encoding;

pub use cancel::CancelToken;
pub use error::{IngestError, IngestResult};
pub use parsers::{ImportFormat, RowParser, RowStream, parser_for};
pub use types::{Columns, ImportOptions, ParsedRow, Value};
