//! Paginated list executor
//!
//! [`Pager`] performs one remote call per `next_page()` and tracks the
//! continuation token between calls. [`run_paginated`] drives a pager to
//! completion, projecting each response through a [`Selector`] and emitting
//! it to an [`OutputSink`] before the next page is requested.

use super::types::{CancelSignal, PaginationOptions, RunSummary, StopReason};
use crate::error::{Error, Result};
use crate::operation::{ListOperation, PagedRequest, PagedResponse};
use crate::output::OutputSink;
use crate::selector::Selector;
use crate::types::OptionStringExt;
use futures::Stream;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pull-based pagination over a [`ListOperation`]
///
/// Each call to [`next_page`](Pager::next_page) issues exactly one request.
/// The token sent with call N+1 is the token returned by call N. The pager
/// finishes after a response without a token, after the first response when
/// auto-iteration is off, or after a failed call.
pub struct Pager<'a, Op: ListOperation> {
    operation: &'a Op,
    request: Op::Request,
    auto_iterate: bool,
    token: Option<String>,
    calls: usize,
    finished: bool,
    cancel: Option<CancelSignal>,
}

impl<'a, Op: ListOperation> Pager<'a, Op> {
    /// Create a pager; the page-size hint and initial token are written into
    /// the request immediately
    ///
    /// A token already set in `request` is treated like
    /// [`PaginationOptions::starting_at`]: it is sent with the first call and
    /// auto-iteration is switched off. An explicit initial token wins.
    pub fn new(operation: &'a Op, mut request: Op::Request, options: PaginationOptions) -> Self {
        let mut auto_iterate = options.auto_iterate;
        let token = match options.initial_token.none_if_empty() {
            Some(token) => Some(token),
            None => {
                let carried = request
                    .continuation_token()
                    .map(str::to_string)
                    .none_if_empty();
                if carried.is_some() {
                    auto_iterate = false;
                }
                carried
            }
        };
        if let Some(size) = options.page_size {
            request.set_page_size(size);
        }
        request.set_continuation_token(token.as_deref());

        Self {
            operation,
            request,
            auto_iterate,
            token,
            calls: 0,
            finished: false,
            cancel: None,
        }
    }

    /// Abort the in-flight call when `signal` fires
    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// The request as it will be (or was last) sent
    pub fn request(&self) -> &Op::Request {
        &self.request
    }

    /// Remote calls issued so far, including a failed one
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Token the next call would send; after a single-page run, the token to
    /// resume from
    pub fn pending_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether no further calls will be made
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next page
    ///
    /// Returns `None` once finished. A failure is returned once, wrapped in
    /// [`Error::PageFailed`], and finishes the pager.
    pub async fn next_page(&mut self) -> Option<Result<Op::Response>> {
        if self.finished {
            return None;
        }

        let page = self.calls + 1;

        if self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            self.finished = true;
            return Some(Err(self.page_error(page, self.cancelled())));
        }

        self.request.set_continuation_token(self.token.as_deref());
        self.calls = page;

        match self.call().await {
            Ok(response) => {
                self.token = response
                    .continuation_token()
                    .map(str::to_string)
                    .none_if_empty();
                if !self.auto_iterate || self.token.is_none() {
                    self.finished = true;
                }
                Some(Ok(response))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(self.page_error(page, e)))
            }
        }
    }

    /// Turn the pager into a stream of page results
    pub fn into_stream(self) -> impl Stream<Item = Result<Op::Response>> + 'a {
        futures::stream::unfold(self, |mut pager| async move {
            let item = pager.next_page().await?;
            Some((item, pager))
        })
    }

    async fn call(&self) -> Result<Op::Response> {
        match &self.cancel {
            Some(signal) => {
                tokio::select! {
                    biased;
                    () = signal.cancelled() => Err(self.cancelled()),
                    result = self.operation.list(&self.request) => result,
                }
            }
            None => self.operation.list(&self.request).await,
        }
    }

    fn cancelled(&self) -> Error {
        Error::Cancelled {
            operation: self.operation.name().to_string(),
        }
    }

    fn page_error(&self, page: usize, source: Error) -> Error {
        Error::page_failed(
            self.operation.name(),
            self.operation.endpoint(),
            page,
            source,
        )
    }
}

impl<Op: ListOperation> std::fmt::Debug for Pager<'_, Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("operation", &self.operation.name())
            .field("auto_iterate", &self.auto_iterate)
            .field("token", &self.token)
            .field("calls", &self.calls)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Drive a list operation to completion, streaming projected pages to `sink`
///
/// The selector and the request are validated before any remote call.
/// In per-page mode each response is projected and emitted before the next
/// call; in parameter-echo mode pages are fetched without output and the
/// echoed value is emitted once at the end. On failure, values already
/// emitted stay emitted and the page's error is returned.
pub async fn run_paginated<Op, S>(
    operation: &Op,
    request: Op::Request,
    options: PaginationOptions,
    selector: &Selector,
    sink: &mut S,
    cancel: Option<CancelSignal>,
) -> Result<RunSummary>
where
    Op: ListOperation,
    S: OutputSink + ?Sized,
{
    let start = Instant::now();

    let mut pager = Pager::new(operation, request, options);
    if let Some(signal) = cancel {
        pager = pager.with_cancel(signal);
    }

    let echo = selector.capture_echo(pager.request())?;
    operation.check_request(pager.request())?;

    info!(operation = operation.name(), "Starting paginated list");

    let mut emitted = 0;
    while let Some(result) = pager.next_page().await {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    operation = operation.name(),
                    page = pager.calls(),
                    "Stopping after failed page: {e}"
                );
                return Err(e);
            }
        };

        debug!(
            operation = operation.name(),
            page = pager.calls(),
            has_more = pager.pending_token().is_some(),
            "Fetched page"
        );

        if let Some(value) = selector.project(&response.to_value()) {
            sink.emit(value).await?;
            emitted += 1;
        }
    }

    if let Some(value) = echo {
        sink.emit(value).await?;
        emitted += 1;
    }
    sink.finish().await?;

    let next_token = pager.pending_token().map(str::to_string);
    let stop_reason = if next_token.is_some() {
        StopReason::SinglePage
    } else {
        StopReason::Exhausted
    };

    let summary = RunSummary {
        pages: pager.calls(),
        emitted,
        next_token,
        stop_reason,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        operation = operation.name(),
        pages = summary.pages,
        emitted = summary.emitted,
        "Completed paginated list in {}ms",
        summary.duration_ms
    );

    Ok(summary)
}
