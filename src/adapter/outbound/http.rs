//! reqwest-backed gateway transport.

use std::error::Error as _;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::domain::FailureKind;
use crate::port::outbound::transport::{
    HttpMethod, HttpReply, HttpRequest, Transport, TransportError,
};

/// HTTP transport for the gateway.
///
/// One pooled client shared by every request; the deadline is applied per
/// request so discovery probes and regular calls can use different timeouts.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        // The gateway lives on the local network; system proxies only get in the way.
        let http = HttpClient::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self { http }
    }

    /// Map a reqwest failure onto the gateway taxonomy.
    fn classify(err: &reqwest::Error) -> FailureKind {
        if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            let chain = source_chain(err);
            if chain.contains("dns") || chain.contains("lookup") {
                FailureKind::DnsFailure
            } else {
                FailureKind::ConnectionRefused
            }
        } else if let Some(status) = err.status() {
            FailureKind::HttpError(status.as_u16())
        } else {
            FailureKind::RequestFailed
        }
    }

    fn failure(err: &reqwest::Error) -> TransportError {
        let kind = Self::classify(err);
        let message = match kind {
            FailureKind::DnsFailure => format!("Cannot resolve gateway host: {err}"),
            FailureKind::ConnectionRefused => format!("Cannot connect to gateway: {err}"),
            FailureKind::Timeout => format!("Request timed out: {err}"),
            _ => format!("Request failed: {err}"),
        };
        TransportError::new(kind, message)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased messages of the error and all of its sources.
fn source_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ").to_lowercase()
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&request.url),
            HttpMethod::Post => self.http.post(&request.url),
        }
        .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| Self::failure(&err))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|err| Self::failure(&err))?;

        debug!(url = %request.url, status, bytes = body.len(), "Gateway reply");

        Ok(HttpReply {
            status,
            body,
            content_type,
        })
    }
}
