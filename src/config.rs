//! Operation definitions
//!
//! A list operation is described declaratively in YAML: where it lives, how
//! the continuation token travels, which field carries the page-size hint,
//! and which part of the response is surfaced by default.
//!
//! ```yaml
//! name: ListCalculationExecutions
//! base_url: https://api.example.com
//! path: /sessions/{{ SessionId }}/calculations
//! method: POST
//! token:
//!   request_field: NextToken
//!   response_path: NextToken
//! page_size:
//!   request_field: MaxResults
//!   max: 100
//! result_path: Calculations
//! ```

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::operation::ListRequest;
use crate::selector::Selector;
use crate::types::{BackoffType, JsonObject, Method};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Operation Config
// ============================================================================

const REDACTED: &str = "***";

/// A paged list operation loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Operation name used in logs and error messages
    pub name: String,

    /// Base URL of the service
    pub base_url: String,

    /// Request path, may contain `{{ Field }}` placeholders
    pub path: String,

    /// HTTP method
    #[serde(default)]
    pub method: Method,

    /// Continuation token wiring
    pub token: TokenConfig,

    /// Page-size hint wiring
    #[serde(default)]
    pub page_size: Option<PageSizeConfig>,

    /// Default selector applied when the caller does not give one
    #[serde(default)]
    pub result_path: Option<String>,

    /// Default request fields
    #[serde(default)]
    pub params: JsonObject,

    /// Static headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where the continuation token lives in requests and responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Request field that carries the token
    pub request_field: String,

    /// Dotted path of the token in the response (defaults to `request_field`)
    #[serde(default)]
    pub response_path: Option<String>,
}

impl TokenConfig {
    /// Response path, falling back to the request field name
    pub fn response_path(&self) -> &str {
        self.response_path
            .as_deref()
            .unwrap_or(&self.request_field)
    }
}

/// Page-size hint wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSizeConfig {
    /// Request field that carries the hint
    pub request_field: String,

    /// Largest value the service accepts
    #[serde(default)]
    pub max: Option<u32>,
}

impl OperationConfig {
    /// Build the request prototype with the default params applied
    pub fn new_request(&self) -> ListRequest {
        let mut request = ListRequest::new(&self.token.request_field);
        if let Some(page_size) = &self.page_size {
            request = request.with_page_size_field(&page_size.request_field);
        }
        request.extend(self.params.clone());
        request
    }

    /// Validate a caller's page-size hint against this operation
    pub fn check_page_size(&self, size: u32) -> Result<NonZeroU32> {
        let Some(page_size) = &self.page_size else {
            return Err(Error::invalid_value(
                "page_size",
                format!("operation '{}' does not accept a page size", self.name),
            ));
        };

        let size = NonZeroU32::new(size)
            .ok_or_else(|| Error::invalid_value("page_size", "must be a positive integer"))?;

        match page_size.max {
            Some(max) if size.get() > max => Err(Error::invalid_value(
                "page_size",
                format!("{size} exceeds the maximum of {max}"),
            )),
            _ => Ok(size),
        }
    }

    /// Default selector for this operation (`result_path`, else `*`)
    pub fn default_selector(&self) -> Result<Selector> {
        match &self.result_path {
            Some(path) => Selector::parse(path),
            None => Ok(Selector::Response),
        }
    }

    /// Copy of this definition with header values masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for value in config.headers.values_mut() {
            *value = REDACTED.to_string();
        }
        config
    }

    /// HTTP client configuration for this operation
    pub fn client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.retry_backoff.backoff_type,
                Duration::from_millis(self.http.retry_backoff.initial_ms),
                Duration::from_millis(self.http.retry_backoff.max_ms),
            );

        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(RateLimiterConfig::new(
                limit.requests_per_second,
                limit.burst,
            )),
            None => builder.no_rate_limit(),
        };

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Rate limiting configuration (absent = unlimited)
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_burst() -> u32 {
    1
}

// ============================================================================
// Loading
// ============================================================================

/// Load an operation definition from a YAML file
pub fn load_operation(path: impl AsRef<Path>) -> Result<OperationConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read operation file '{}': {e}",
            path.display()
        ))
    })?;
    load_operation_from_str(&content)
}

/// Load an operation definition from a YAML string
pub fn load_operation_from_str(yaml: &str) -> Result<OperationConfig> {
    let config: OperationConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse operation YAML: {e}")))?;

    validate_operation(&config)?;
    Ok(config)
}

/// Validate an operation definition
pub fn validate_operation(config: &OperationConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(Error::config("Operation name cannot be empty"));
    }

    if config.base_url.is_empty() {
        return Err(Error::missing_field("base_url"));
    }
    url::Url::parse(&config.base_url)?;

    if config.path.is_empty() {
        return Err(Error::config(format!(
            "Operation '{}' path cannot be empty",
            config.name
        )));
    }

    if config.token.request_field.is_empty() {
        return Err(Error::missing_field("token.request_field"));
    }
    if config.token.response_path().trim_start_matches("$.").is_empty() {
        return Err(Error::invalid_value(
            "token.response_path",
            "cannot be empty",
        ));
    }

    if let Some(page_size) = &config.page_size {
        if page_size.request_field.is_empty() {
            return Err(Error::missing_field("page_size.request_field"));
        }
        if page_size.max == Some(0) {
            return Err(Error::invalid_value("page_size.max", "must be positive"));
        }
    }

    if let Some(path) = &config.result_path {
        Selector::parse(path)?;
    }

    Ok(())
}
