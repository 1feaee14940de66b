//! Request/response abstractions for paged list operations
//!
//! The executor only needs three capabilities from a remote list call:
//! write a continuation token (and page-size hint) into the request, read
//! the continuation token back out of the response, and turn a response into
//! a JSON value the selector can project.

use crate::error::Result;
use crate::types::{JsonObject, JsonValue, OptionStringExt};
use async_trait::async_trait;
use serde_json::Value;
use std::num::NonZeroU32;

/// A request whose pagination fields the executor can drive
pub trait PagedRequest: Send + Sync {
    /// Set (or clear, with `None`) the continuation token field
    fn set_continuation_token(&mut self, token: Option<&str>);

    /// Token already present in the request, if any
    fn continuation_token(&self) -> Option<&str>;

    /// Forward the page-size hint, if the request supports one
    fn set_page_size(&mut self, size: NonZeroU32);

    /// Read a caller-supplied parameter by name, for parameter echo
    fn parameter(&self, name: &str) -> Option<JsonValue>;
}

/// A response carrying an optional continuation token
pub trait PagedResponse: Send + Sync {
    /// Token for the next page; `None` or empty means no more pages
    fn continuation_token(&self) -> Option<&str>;

    /// JSON view of the response used for selector projection
    fn to_value(&self) -> JsonValue;
}

/// A remote "list" operation: `Request -> Response | Error`
#[async_trait]
pub trait ListOperation: Send + Sync {
    /// Request type sent on every page
    type Request: PagedRequest;
    /// Response type returned for every page
    type Response: PagedResponse;

    /// Operation name used in diagnostics (e.g. "ListCalculationExecutions")
    fn name(&self) -> &str;

    /// Endpoint description used in diagnostics
    fn endpoint(&self) -> String;

    /// Reject a request that can never be sent, before the first call
    fn check_request(&self, _request: &Self::Request) -> Result<()> {
        Ok(())
    }

    /// Fetch a single page
    async fn list(&self, request: &Self::Request) -> Result<Self::Response>;
}

// ============================================================================
// JSON request/response
// ============================================================================

/// A request made of named JSON fields
///
/// Holds the caller's fields plus the names of the token and page-size
/// fields. The token field is removed entirely when no token is set, so the
/// first page is sent without it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    fields: JsonObject,
    token_field: String,
    page_size_field: Option<String>,
}

impl ListRequest {
    /// Create an empty request with the given token field name
    pub fn new(token_field: impl Into<String>) -> Self {
        Self {
            fields: JsonObject::new(),
            token_field: token_field.into(),
            page_size_field: None,
        }
    }

    /// Set the page-size field name
    #[must_use]
    pub fn with_page_size_field(mut self, field: impl Into<String>) -> Self {
        self.page_size_field = Some(field.into());
        self
    }

    /// Set a named field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a named field in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Merge every entry of `fields` into the request, overwriting existing ones
    pub fn extend(&mut self, fields: JsonObject) {
        self.fields.extend(fields);
    }

    /// Get a named field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All fields, including token and page size when set
    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    /// Name of the continuation token field
    pub fn token_field(&self) -> &str {
        &self.token_field
    }

    /// Name of the page-size field, if any
    pub fn page_size_field(&self) -> Option<&str> {
        self.page_size_field.as_deref()
    }

    /// Current continuation token
    pub fn continuation_token(&self) -> Option<&str> {
        self.fields.get(&self.token_field).and_then(Value::as_str)
    }
}

impl PagedRequest for ListRequest {
    fn set_continuation_token(&mut self, token: Option<&str>) {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.fields
                    .insert(self.token_field.clone(), Value::String(token.to_string()));
            }
            None => {
                self.fields.remove(&self.token_field);
            }
        }
    }

    fn continuation_token(&self) -> Option<&str> {
        ListRequest::continuation_token(self)
    }

    fn set_page_size(&mut self, size: NonZeroU32) {
        if let Some(field) = &self.page_size_field {
            self.fields.insert(field.clone(), Value::from(size.get()));
        }
    }

    fn parameter(&self, name: &str) -> Option<JsonValue> {
        self.fields.get(name).cloned()
    }
}

/// A decoded JSON response plus the token extracted from it
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse {
    body: Value,
    next_token: Option<String>,
}

impl ListResponse {
    /// Build a response from a body, reading the token at a dotted path
    pub fn from_body(body: Value, token_path: &str) -> Self {
        let next_token = extract_token(&body, token_path);
        Self { body, next_token }
    }

    /// Build a response with an explicit token
    pub fn new(body: Value, next_token: Option<String>) -> Self {
        Self {
            body,
            next_token: next_token.none_if_empty(),
        }
    }

    /// The decoded body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the response, returning the body
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl PagedResponse for ListResponse {
    fn continuation_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    fn to_value(&self) -> JsonValue {
        self.body.clone()
    }
}

/// Extract a continuation token from a dotted path (`$.` prefix optional)
///
/// Only string and number values count as tokens; `null`, missing and empty
/// values all mean "no more pages".
pub fn extract_token(body: &Value, path: &str) -> Option<String> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = body;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }

    match current {
        Value::String(s) => s.clone().none_if_empty(),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
