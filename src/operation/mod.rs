//! Remote list operations
//!
//! # Overview
//!
//! The executor talks to remote services only through the [`ListOperation`]
//! trait. This module defines that seam and ships:
//! - `ListRequest` / `ListResponse` - JSON-backed request and response
//! - `HttpListOperation` - a REST implementation over [`crate::http::HttpClient`]

mod http;
mod types;

pub use http::HttpListOperation;
pub use types::{
    extract_token, ListOperation, ListRequest, ListResponse, PagedRequest, PagedResponse,
};
