//! Pagination module
//!
//! Token-driven pagination over a [`ListOperation`](crate::operation::ListOperation).
//!
//! # Overview
//!
//! A run sends the caller's request, reads the continuation token from the
//! response, and sends the same request again with that token until the
//! server stops returning one. Every page is projected through a
//! [`Selector`](crate::selector::Selector) and emitted before the next page
//! is fetched. A non-empty starting token, or turning auto-iteration off,
//! limits the run to a single call so callers can page manually.

mod executor;
mod types;

pub use executor::{run_paginated, Pager};
pub use types::{CancelSignal, PaginationOptions, RunSummary, StopReason};
