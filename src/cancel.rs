//! Cooperative cancellation for row streams.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheap, cloneable cancellation handle shared between a parse and its
/// caller.
///
/// Parsers check the token at the top of every iteration step. Once the
/// token fires, the stream yields [`crate::IngestError::Cancelled`]
/// exactly once and then ends. Cancellation is a distinct outcome and is
/// never reported as a row-level `parse_error`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, unfired token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from another thread; all
    /// clones observe the request.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`CancelToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
