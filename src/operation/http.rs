//! HTTP/JSON list operation
//!
//! Sends a [`ListRequest`] to a REST endpoint and decodes the JSON reply into
//! a [`ListResponse`]. Fields named in the path template are substituted into
//! the URL; the rest travel as query parameters (GET) or as a JSON body.

use super::types::{ListOperation, ListRequest, ListResponse};
use crate::config::OperationConfig;
use crate::error::{Result, ResultExt};
use crate::http::{HttpClient, RequestConfig};
use crate::template;
use crate::types::{JsonObject, Method};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// A list operation backed by an HTTP endpoint
#[derive(Debug)]
pub struct HttpListOperation {
    name: String,
    client: HttpClient,
    method: Method,
    path: String,
    token_path: String,
}

impl HttpListOperation {
    /// Create an operation over an existing client
    pub fn new(
        name: impl Into<String>,
        client: HttpClient,
        method: Method,
        path: impl Into<String>,
        token_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            method,
            path: path.into(),
            token_path: token_path.into(),
        }
    }

    /// Build the operation and its client from a validated definition
    pub fn from_config(config: &OperationConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.client_config())
            .with_context(|| format!("Failed to build HTTP client for '{}'", config.name))?;
        Ok(Self::new(
            &config.name,
            client,
            config.method,
            &config.path,
            config.token.response_path(),
        ))
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Split request fields into the rendered path and the remaining payload
    fn prepare(&self, request: &ListRequest) -> Result<(String, JsonObject)> {
        let path = template::render(&self.path, request.fields())?;

        let path_vars: HashSet<String> = template::extract_variables(&self.path)
            .into_iter()
            .filter_map(|v| v.split('.').next().map(str::to_string))
            .collect();

        let payload = request
            .fields()
            .iter()
            .filter(|(name, value)| !path_vars.contains(*name) && !value.is_null())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok((path, payload))
    }
}

#[async_trait]
impl ListOperation for HttpListOperation {
    type Request = ListRequest;
    type Response = ListResponse;

    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> String {
        self.client.build_url(&self.path)
    }

    fn check_request(&self, request: &ListRequest) -> Result<()> {
        template::render(&self.path, request.fields()).map(drop)
    }

    async fn list(&self, request: &ListRequest) -> Result<ListResponse> {
        let (path, payload) = self.prepare(request)?;

        let mut call = RequestConfig::new();
        if self.method.sends_body() {
            call = call.json(Value::Object(payload));
        } else {
            for (key, value) in &payload {
                call = call.query(key, query_value(value));
            }
        }

        debug!(
            operation = %self.name,
            token = request.continuation_token().unwrap_or(""),
            "Calling {:?} {}",
            self.method,
            path
        );

        let body: Value = self
            .client
            .send_json(self.method.into(), &path, &call)
            .await?;

        Ok(ListResponse::from_body(body, &self.token_path))
    }
}

/// Render a field as a query-string value; arrays become comma-separated
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(query_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod http_operation_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_value() {
        assert_eq!(query_value(&json!("abc")), "abc");
        assert_eq!(query_value(&json!(25)), "25");
        assert_eq!(query_value(&json!(true)), "true");
        assert_eq!(query_value(&json!(["a", "b", 3])), "a,b,3");
    }
}
