use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{DataType, FailureKind};

/// Longest raw-content snippet a [`GatewayError`] keeps for diagnostics.
pub const SNIPPET_LIMIT: usize = 1000;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Closed classification of everything that can go wrong between the
/// gateway and a parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DnsFailure,
    ConnectionRefused,
    Timeout,
    HttpError(u16),
    RequestFailed,
    EmptyContent,
    InvalidXmlStart,
    HtmlResponse,
    JsonResponse,
    ParseError,
    EmptyStructure,
    TallyErrorResponse,
    AuthError,
    MissingData(DataType),
    /// The request could not be built, e.g. a required parameter is missing.
    InvalidRequest,
    TaskException,
}

impl ErrorKind {
    /// Stable classification code, e.g. `PARSE_ERROR`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DnsFailure => "DNS_FAILURE",
            Self::ConnectionRefused => "CONNECTION_REFUSED",
            Self::Timeout => "TIMEOUT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::InvalidXmlStart => "INVALID_XML_START",
            Self::HtmlResponse => "HTML_RESPONSE",
            Self::JsonResponse => "JSON_RESPONSE",
            Self::ParseError => "PARSE_ERROR",
            Self::EmptyStructure => "EMPTY_STRUCTURE",
            Self::TallyErrorResponse => "TALLY_ERROR_RESPONSE",
            Self::AuthError => "AUTH_ERROR",
            Self::MissingData(data_type) => data_type.missing_data_code(),
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::TaskException => "TASK_EXCEPTION",
        }
    }

    /// Whether this kind describes a malformed or invalid reply body, as
    /// opposed to a transport failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::DnsFailure
                | Self::ConnectionRefused
                | Self::Timeout
                | Self::HttpError(_)
                | Self::RequestFailed
                | Self::InvalidRequest
                | Self::TaskException
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError(status) => write!(f, "HTTP_ERROR({status})"),
            other => f.write_str(other.code()),
        }
    }
}

impl From<FailureKind> for ErrorKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::DnsFailure => Self::DnsFailure,
            FailureKind::ConnectionRefused => Self::ConnectionRefused,
            FailureKind::Timeout => Self::Timeout,
            FailureKind::HttpError(status) => Self::HttpError(status),
            FailureKind::RequestFailed => Self::RequestFailed,
        }
    }
}

/// A classified gateway failure with enough context to debug it later.
///
/// Never holds unbounded data: the raw content is cut to [`SNIPPET_LIMIT`]
/// characters and the underlying cause is kept as text.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    pub snippet: Option<String>,
    pub cause: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            snippet: None,
            cause: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: &str) -> Self {
        self.snippet = Some(truncate_chars(content, SNIPPET_LIMIT).to_string());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Serialisable view used by the diagnostics log.
    #[must_use]
    pub fn debug_info(&self) -> ErrorReport {
        ErrorReport {
            error_type: self.kind.code(),
            status_code: match self.kind {
                ErrorKind::HttpError(status) => Some(status),
                _ => None,
            },
            message: self.message.clone(),
            timestamp: self.timestamp,
            cause: self.cause.clone(),
            snippet_length: self.snippet.as_ref().map_or(0, |s| s.chars().count()),
            snippet: self.snippet.clone(),
        }
    }
}

/// Diagnostic record of a [`GatewayError`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error_type: &'static str,
    pub status_code: Option<u16>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub cause: Option<String>,
    pub snippet: Option<String>,
    pub snippet_length: usize,
}

/// Cut `s` to at most `limit` characters without splitting a code point.
pub(crate) fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, Error>;
