//! Error types for pagewalk
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for pagewalk
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Selector Errors
    // ============================================================================
    #[error("Invalid value for select expression '{expression}': {message}")]
    InvalidSelector { expression: String, message: String },

    #[error("Unknown parameter '{name}' in select expression")]
    UnknownParameter { name: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Unable to reach {endpoint}: {message}")]
    Unreachable { endpoint: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("{operation} failed on page {page} ({endpoint}): {source}")]
    PageFailed {
        operation: String,
        endpoint: String,
        page: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation '{operation}' was cancelled")]
    Cancelled { operation: String },

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid selector error
    pub fn invalid_selector(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Wrap an error raised by a single page fetch with the call's context
    pub fn page_failed(
        operation: impl Into<String>,
        endpoint: impl Into<String>,
        page: usize,
        source: Error,
    ) -> Self {
        Self::PageFailed {
            operation: operation.into(),
            endpoint: endpoint.into(),
            page,
            source: Box::new(source),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_)
            | Error::RateLimited { .. }
            | Error::Timeout { .. }
            | Error::Unreachable { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            Error::PageFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Check if this error was raised before any remote call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::InvalidSelector { .. }
                | Error::UnknownParameter { .. }
                | Error::UndefinedVariable { .. }
        )
    }

    /// Check if this error is (or wraps) a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled { .. } => true,
            Error::PageFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for pagewalk
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("base_url");
        assert_eq!(err.to_string(), "Missing required config field: base_url");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::invalid_selector("^", "parameter name is empty");
        assert_eq!(
            err.to_string(),
            "Invalid value for select expression '^': parameter name is empty"
        );
    }

    #[test]
    fn test_page_failed_display() {
        let err = Error::page_failed(
            "ListWidgets",
            "https://api.example.com/widgets",
            3,
            Error::http_status(500, "boom"),
        );
        assert_eq!(
            err.to_string(),
            "ListWidgets failed on page 3 (https://api.example.com/widgets): HTTP 500: boom"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::Unreachable {
            endpoint: "http://127.0.0.1:1".into(),
            message: "connection refused".into(),
        }
        .is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::config("test").is_retryable());

        let wrapped = Error::page_failed("op", "ep", 1, Error::http_status(503, ""));
        assert!(wrapped.is_retryable());
    }

    #[test]
    fn test_is_validation_and_cancelled() {
        assert!(Error::invalid_selector("", "empty").is_validation());
        assert!(Error::invalid_value("page_size", "must be positive").is_validation());
        assert!(!Error::http_status(500, "").is_validation());
        assert!(Error::undefined_var("SessionId").is_validation());

        let cancelled = Error::Cancelled {
            operation: "ListWidgets".to_string(),
        };
        assert!(cancelled.is_cancelled());
        assert!(Error::page_failed("op", "ep", 2, cancelled).is_cancelled());
        assert!(!Error::config("x").is_cancelled());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
