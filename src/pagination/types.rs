//! Pagination types
//!
//! Invocation options, run summaries and the cooperative cancel signal.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// How a single invocation paginates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Token for the first call; `None` starts from the beginning
    pub initial_token: Option<String>,
    /// Keep fetching while the server returns a token
    pub auto_iterate: bool,
    /// Page-size hint forwarded to the request
    pub page_size: Option<NonZeroU32>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            initial_token: None,
            auto_iterate: true,
            page_size: None,
        }
    }
}

impl PaginationOptions {
    /// Fetch every page from the beginning
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a caller-supplied token
    ///
    /// A non-empty token means the caller is paging manually, so
    /// auto-iteration is switched off. An empty token is the same as none.
    #[must_use]
    pub fn starting_at(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if token.is_empty() {
            self.initial_token = None;
        } else {
            self.initial_token = Some(token);
            self.auto_iterate = false;
        }
        self
    }

    /// Fetch exactly one page
    #[must_use]
    pub fn no_auto_iteration(mut self) -> Self {
        self.auto_iterate = false;
        self
    }

    /// Forward a page-size hint
    #[must_use]
    pub fn with_page_size(mut self, size: NonZeroU32) -> Self {
        self.page_size = Some(size);
        self
    }
}

/// Why a successful run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The server returned no continuation token
    Exhausted,
    /// Auto-iteration was off and the server still had more pages
    SinglePage,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages received (and projected, in per-page mode)
    pub pages: usize,
    /// Values handed to the sink, including a final echo
    pub emitted: usize,
    /// Token to resume from when the run stopped with more data available
    pub next_token: Option<String>,
    /// Why the run stopped
    pub stop_reason: StopReason,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Whether the server still has pages the run did not fetch
    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}

/// Cooperative cancellation shared between a run and its controller
///
/// Cloning shares the signal. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    /// Create an untriggered signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation, waking any pending waiters
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation has been triggered
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been triggered
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
