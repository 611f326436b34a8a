//! Results of gateway round trips.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::xml::XmlElement;
use crate::error::GatewayError;

/// Classified transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    DnsFailure,
    ConnectionRefused,
    Timeout,
    HttpError(u16),
    /// Any other transport fault (malformed URL, reset, body read error).
    RequestFailed,
}

impl FailureKind {
    /// Failures that a later attempt may not repeat.
    ///
    /// DNS failures and 4xx replies are deterministic for a fixed
    /// configuration and are never retried.
    #[must_use]
    pub fn is_transient(self) -> bool {
        match self {
            Self::ConnectionRefused | Self::Timeout | Self::RequestFailed => true,
            Self::HttpError(status) => (500..600).contains(&status),
            Self::DnsFailure => false,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::DnsFailure => "DNS_FAILURE",
            Self::ConnectionRefused => "CONNECTION_REFUSED",
            Self::Timeout => "TIMEOUT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::RequestFailed => "REQUEST_FAILED",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError(status) => write!(f, "HTTP_ERROR({status})"),
            other => f.write_str(other.code()),
        }
    }
}

/// Parsed, validated content of a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum Payload {
    Document(Arc<XmlElement>),
    /// Lines recovered from a plain-text report.
    Report(Arc<[String]>),
}

impl Payload {
    #[must_use]
    pub fn as_document(&self) -> Option<&XmlElement> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Report(_) => None,
        }
    }

    #[must_use]
    pub fn as_report(&self) -> Option<&[String]> {
        match self {
            Self::Report(lines) => Some(lines),
            Self::Document(_) => None,
        }
    }

    /// Top-level element count for documents, line count for reports.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::Document(doc) => doc.children.len(),
            Self::Report(lines) => lines.len(),
        }
    }
}

/// Outcome of one gateway call. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub success: bool,
    pub status_code: Option<u16>,
    pub body: String,
    pub response_time: Duration,
    pub error_message: Option<String>,
    pub content_type: Option<String>,
    pub from_cache: bool,
    pub failure: Option<FailureKind>,
    pub payload: Option<Payload>,
    pub error: Option<GatewayError>,
}

impl GatewayResponse {
    /// A completed HTTP exchange with a 2xx status.
    pub fn ok(
        status_code: u16,
        body: String,
        content_type: Option<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            body,
            response_time,
            error_message: None,
            content_type,
            from_cache: false,
            failure: None,
            payload: None,
            error: None,
        }
    }

    /// A transport failure.
    pub fn failed(
        failure: FailureKind,
        message: impl Into<String>,
        response_time: Duration,
    ) -> Self {
        let status_code = match failure {
            FailureKind::HttpError(status) => Some(status),
            _ => None,
        };
        Self {
            success: false,
            status_code,
            body: String::new(),
            response_time,
            error_message: Some(message.into()),
            content_type: None,
            from_cache: false,
            failure: Some(failure),
            payload: None,
            error: None,
        }
    }

    /// A request refused before reaching the network.
    pub fn invalid(error: GatewayError) -> Self {
        Self {
            success: false,
            status_code: None,
            body: String::new(),
            response_time: Duration::ZERO,
            error_message: Some(error.message.clone()),
            content_type: None,
            from_cache: false,
            failure: None,
            payload: None,
            error: Some(error),
        }
    }

    /// Served from the cache without touching the network.
    pub fn cached(cached: CachedResponse) -> Self {
        Self {
            success: true,
            status_code: Some(200),
            body: cached.body,
            response_time: Duration::ZERO,
            error_message: None,
            content_type: cached.content_type,
            from_cache: true,
            failure: None,
            payload: Some(cached.payload),
            error: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Turn a transport success into a validation failure.
    #[must_use]
    pub fn into_rejected(mut self, error: GatewayError) -> Self {
        self.success = false;
        self.error_message = Some(error.message.clone());
        self.error = Some(error);
        self
    }
}

/// What the reader keeps in its cache for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub body: String,
    pub content_type: Option<String>,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures() {
        assert!(FailureKind::ConnectionRefused.is_transient());
        assert!(FailureKind::Timeout.is_transient());
        assert!(FailureKind::HttpError(503).is_transient());
        assert!(!FailureKind::HttpError(404).is_transient());
        assert!(!FailureKind::DnsFailure.is_transient());
    }

    #[test]
    fn failed_response_keeps_http_status() {
        let resp = GatewayResponse::failed(FailureKind::HttpError(502), "bad gateway", Duration::ZERO);
        assert!(!resp.success);
        assert_eq!(resp.status_code, Some(502));
        assert_eq!(resp.failure, Some(FailureKind::HttpError(502)));
    }

    #[test]
    fn cached_response_is_flagged() {
        let payload = Payload::Report(Arc::from(vec!["Cash".to_string()]));
        let resp = GatewayResponse::cached(CachedResponse {
            body: "Cash".into(),
            content_type: None,
            payload: payload.clone(),
        });
        assert!(resp.from_cache);
        assert_eq!(resp.payload, Some(payload));
    }
}
