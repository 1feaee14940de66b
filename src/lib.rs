// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagewalk
//!
//! Drive token-paginated "list" APIs to completion and stream the part of
//! each page you care about.
//!
//! ## Features
//!
//! - **Token pagination**: the token returned by page N is sent with page N+1
//!   until the service stops returning one
//! - **Manual paging**: start from a caller token, or fetch a single page
//! - **Selectors**: whole response, a field path, a JSONPath, or an echo of a
//!   request parameter (`^Name`)
//! - **Streaming**: every page is emitted before the next one is requested
//! - **YAML operations**: describe a REST list endpoint declaratively
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewalk::config::load_operation;
//! use pagewalk::operation::HttpListOperation;
//! use pagewalk::output::CollectSink;
//! use pagewalk::pagination::{run_paginated, PaginationOptions};
//!
//! #[tokio::main]
//! async fn main() -> pagewalk::Result<()> {
//!     let config = load_operation("operations/list_calculations.yaml")?;
//!     let operation = HttpListOperation::from_config(&config)?;
//!     let request = config.new_request().with_field("SessionId", "s-1");
//!
//!     let mut sink = CollectSink::new();
//!     let summary = run_paginated(
//!         &operation,
//!         request,
//!         PaginationOptions::new(),
//!         &config.default_selector()?,
//!         &mut sink,
//!         None,
//!     )
//!     .await?;
//!
//!     println!("{} pages, {} values", summary.pages, sink.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  run_paginated(operation, request, options, selector, sink)  │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────────┴──┬──────────────┬─────────────┐
//! │   Pager    │   ListOperation    │   Selector   │ OutputSink  │
//! ├────────────┼────────────────────┼──────────────┼─────────────┤
//! │ token loop │ HttpListOperation  │ * / $        │ Collect     │
//! │ single page│  retry, backoff    │ field path   │ Writer      │
//! │ cancel     │  rate limit        │ JSONPath     │ Channel     │
//! │            │                    │ ^Param echo  │             │
//! └────────────┴────────────────────┴──────────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Remote list operations
pub mod operation;

/// Token-driven pagination
pub mod pagination;

/// Output selectors
pub mod selector;

/// Output sinks
pub mod output;

/// YAML operation definitions
pub mod config;

/// Template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_operation, load_operation_from_str, OperationConfig};
pub use operation::{HttpListOperation, ListOperation, ListRequest, ListResponse};
pub use output::{CollectSink, OutputSink};
pub use pagination::{run_paginated, CancelSignal, PaginationOptions, Pager, RunSummary};
pub use selector::Selector;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
