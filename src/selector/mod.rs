//! Output selector
//!
//! Decides what a paginated invocation surfaces for each page.
//!
//! | Expression | Selector | Emitted |
//! |---|---|---|
//! | `*` | [`Selector::Response`] | the whole response, per page |
//! | `Items`, `Page.Items[0]` | [`Selector::Field`] | a sub-field, per page |
//! | `$..Id` | [`Selector::Field`] | JSONPath matches, per page |
//! | `^Name` | [`Selector::Parameter`] | the caller's own input, once at the end |
//!
//! Per-page projection and the end-of-stream echo are mutually exclusive.

use crate::error::{Error, Result};
use crate::operation::PagedRequest;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// A single dotted-path segment: `Name` or `Name[3]` / `Name[-1]`
static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_\-]*)(?:\[(-?\d+)\])?$").expect("segment regex is valid")
});

/// A parameter name for `^Name` echo
static PARAMETER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("parameter regex is valid")
});

/// Projection function supplied by library callers
pub type ProjectFn = dyn Fn(&Value) -> Value + Send + Sync;

/// When a selector produces output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Applied to every response as it arrives
    PerPage,
    /// Resolved once, after the last page
    EndOfStream,
}

/// One step of a dotted field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Object key
    pub key: String,
    /// Optional array index; negative counts from the end
    pub index: Option<i64>,
}

/// A path into the response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// `A.B[0].C`
    Dotted(Vec<PathSegment>),
    /// A JSONPath expression starting with `$`
    JsonPath(String),
}

impl FieldPath {
    fn extract(&self, value: &Value) -> Value {
        match self {
            FieldPath::Dotted(segments) => extract_dotted(value, segments).unwrap_or(Value::Null),
            FieldPath::JsonPath(expr) => extract_jsonpath(value, expr).unwrap_or(Value::Null),
        }
    }
}

/// What to surface from each response
#[derive(Clone, Default)]
pub enum Selector {
    /// The whole response
    #[default]
    Response,
    /// A sub-field of the response body
    Field(FieldPath),
    /// Echo of a caller-supplied request parameter, emitted once at the end
    Parameter(String),
    /// A caller-supplied projection
    Custom(Arc<ProjectFn>),
}

impl Selector {
    /// Parse a select expression, failing fast on malformed input
    pub fn parse(expression: &str) -> Result<Self> {
        let expr = expression.trim();

        if expr.is_empty() {
            return Err(Error::invalid_selector(expression, "expression is empty"));
        }

        if expr == "*" {
            return Ok(Selector::Response);
        }

        if let Some(name) = expr.strip_prefix('^') {
            if name.is_empty() {
                return Err(Error::invalid_selector(expression, "parameter name is empty"));
            }
            if !PARAMETER_REGEX.is_match(name) {
                return Err(Error::invalid_selector(
                    expression,
                    format!("'{name}' is not a valid parameter name"),
                ));
            }
            return Ok(Selector::Parameter(name.to_string()));
        }

        if expr == "$" {
            return Ok(Selector::Response);
        }

        if expr.starts_with('$') {
            if let Some(path) = expr.strip_prefix("$.") {
                if !has_jsonpath_syntax(expr) {
                    return parse_dotted(expression, path);
                }
            }
            validate_jsonpath(expression, expr)?;
            return Ok(Selector::Field(FieldPath::JsonPath(expr.to_string())));
        }

        parse_dotted(expression, expr)
    }

    /// Wrap a projection function
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Selector::Custom(Arc::new(f))
    }

    /// When this selector produces output
    pub fn mode(&self) -> SelectionMode {
        match self {
            Selector::Parameter(_) => SelectionMode::EndOfStream,
            _ => SelectionMode::PerPage,
        }
    }

    /// Project one response; `None` in end-of-stream mode
    pub fn project(&self, response: &Value) -> Option<Value> {
        match self {
            Selector::Response => Some(response.clone()),
            Selector::Field(path) => Some(path.extract(response)),
            Selector::Custom(f) => Some(f(response)),
            Selector::Parameter(_) => None,
        }
    }

    /// Capture the echoed parameter from the request, before any call
    ///
    /// Returns `Ok(None)` for per-page selectors and an error when the
    /// request does not carry the named parameter.
    pub fn capture_echo<R: PagedRequest>(&self, request: &R) -> Result<Option<Value>> {
        match self {
            Selector::Parameter(name) => request
                .parameter(name)
                .map(Some)
                .ok_or_else(|| Error::UnknownParameter { name: name.clone() }),
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Response => f.write_str("Response"),
            Selector::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Selector::Parameter(name) => f.debug_tuple("Parameter").field(name).finish(),
            Selector::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl std::str::FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

/// Wildcards, recursive descent, filters and slices need a real JSONPath engine
fn has_jsonpath_syntax(expr: &str) -> bool {
    ["*", "..", "?(", ":", "'", "\""]
        .iter()
        .any(|marker| expr.contains(marker))
}

fn validate_jsonpath(original: &str, expr: &str) -> Result<()> {
    use jsonpath_rust::JsonPath;

    let parsed: std::result::Result<JsonPath, _> = JsonPath::try_from(expr);
    parsed
        .map(|_| ())
        .map_err(|e| Error::invalid_selector(original, format!("invalid JSONPath: {e}")))
}

fn parse_dotted(original: &str, path: &str) -> Result<Selector> {
    let segments = path
        .split('.')
        .map(|part| parse_segment(original, part))
        .collect::<Result<Vec<_>>>()?;

    Ok(Selector::Field(FieldPath::Dotted(segments)))
}

fn parse_segment(original: &str, part: &str) -> Result<PathSegment> {
    let caps = SEGMENT_REGEX.captures(part).ok_or_else(|| {
        if part.is_empty() {
            Error::invalid_selector(original, "path contains an empty segment")
        } else {
            Error::invalid_selector(original, format!("'{part}' is not a valid field name"))
        }
    })?;

    let index = match caps.get(2) {
        Some(m) => Some(m.as_str().parse::<i64>().map_err(|e| {
            Error::invalid_selector(original, format!("invalid index '{}': {e}", m.as_str()))
        })?),
        None => None,
    };

    Ok(PathSegment {
        key: caps[1].to_string(),
        index,
    })
}

fn extract_dotted(value: &Value, segments: &[PathSegment]) -> Option<Value> {
    let mut current = value;
    for segment in segments {
        current = current.as_object()?.get(&segment.key)?;
        if let Some(index) = segment.index {
            let arr = current.as_array()?;
            let idx = if index < 0 {
                arr.len().checked_sub(index.unsigned_abs() as usize)?
            } else {
                index as usize
            };
            current = arr.get(idx)?;
        }
    }
    Some(current.clone())
}

fn extract_jsonpath(value: &Value, expr: &str) -> Option<Value> {
    use jsonpath_rust::JsonPath;

    let jp: JsonPath = JsonPath::try_from(expr).ok()?;
    Some(jp.find(value))
}
