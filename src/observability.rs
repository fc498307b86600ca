//! Observer hooks for streaming parse outcomes.
//!
//! [`ImportOptions`](crate::types::ImportOptions) is pure data, so
//! observation is a stream adapter rather than a configuration field:
//! wrap any [`RowStream`] with [`observe`] and the observer sees error
//! rows as they flow plus a final completion (or cancellation) callback.

use std::fmt;
use std::sync::Arc;

use crate::error::{IngestError, IngestResult};
use crate::parsers::{ImportFormat, RowStream};
use crate::types::ParsedRow;

/// Context about one parse operation.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Format used for the parse.
    pub format: ImportFormat,
    /// Caller-supplied source label (file name, upload id), if any.
    pub source: Option<String>,
}

/// Counters reported when a stream finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseStats {
    /// Total rows yielded, error rows included.
    pub rows: usize,
    /// Rows yielded with a `parse_error`.
    pub error_rows: usize,
}

/// Observer interface for streaming parse outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ParseObserver: Send + Sync {
    /// Called for every error row, as it is yielded.
    fn on_row_error(&self, _ctx: &ParseContext, _line: u64, _message: &str) {}

    /// Called once when the stream is exhausted.
    fn on_complete(&self, _ctx: &ParseContext, _stats: ParseStats) {}

    /// Called once if the stream ends on cancellation instead.
    fn on_cancelled(&self, _ctx: &ParseContext, _stats: ParseStats) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ParseObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ParseObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ParseObserver for CompositeObserver {
    fn on_row_error(&self, ctx: &ParseContext, line: u64, message: &str) {
        for o in &self.observers {
            o.on_row_error(ctx, line, message);
        }
    }

    fn on_complete(&self, ctx: &ParseContext, stats: ParseStats) {
        for o in &self.observers {
            o.on_complete(ctx, stats);
        }
    }

    fn on_cancelled(&self, ctx: &ParseContext, stats: ParseStats) {
        for o in &self.observers {
            o.on_cancelled(ctx, stats);
        }
    }
}

/// Logs parse events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ParseObserver for StdErrObserver {
    fn on_row_error(&self, ctx: &ParseContext, line: u64, message: &str) {
        eprintln!(
            "[parse][row-error] format={:?} source={} line={} err={}",
            ctx.format,
            ctx.source.as_deref().unwrap_or("-"),
            line,
            message
        );
    }

    fn on_complete(&self, ctx: &ParseContext, stats: ParseStats) {
        eprintln!(
            "[parse][ok] format={:?} source={} rows={} error_rows={}",
            ctx.format,
            ctx.source.as_deref().unwrap_or("-"),
            stats.rows,
            stats.error_rows
        );
    }

    fn on_cancelled(&self, ctx: &ParseContext, stats: ParseStats) {
        eprintln!(
            "[parse][cancelled] format={:?} source={} rows={}",
            ctx.format,
            ctx.source.as_deref().unwrap_or("-"),
            stats.rows
        );
    }
}

/// Wrap a stream so `observer` sees rows and completion while they flow.
pub fn observe<'r>(
    stream: RowStream<'r>,
    ctx: ParseContext,
    observer: Arc<dyn ParseObserver>,
) -> RowStream<'r> {
    Box::new(ObservedRows {
        inner: stream,
        ctx,
        observer,
        stats: ParseStats::default(),
        reported: false,
    })
}

struct ObservedRows<'r> {
    inner: RowStream<'r>,
    ctx: ParseContext,
    observer: Arc<dyn ParseObserver>,
    stats: ParseStats,
    reported: bool,
}

impl Iterator for ObservedRows<'_> {
    type Item = IngestResult<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(Ok(row)) => {
                self.stats.rows += 1;
                if let Some(message) = &row.parse_error {
                    self.stats.error_rows += 1;
                    self.observer.on_row_error(&self.ctx, row.line_number, message);
                }
                Some(Ok(row))
            }
            Some(Err(err)) => {
                if matches!(err, IngestError::Cancelled) && !self.reported {
                    self.reported = true;
                    self.observer.on_cancelled(&self.ctx, self.stats);
                }
                Some(Err(err))
            }
            None => {
                if !self.reported {
                    self.reported = true;
                    self.observer.on_complete(&self.ctx, self.stats);
                }
                None
            }
        }
    }
}
