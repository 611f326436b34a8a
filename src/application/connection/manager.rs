//! Gateway connection manager.
//!
//! Owns the connection configuration, the status state machine, the retry
//! loop and the request counters. Every failure is returned as data; nothing
//! here panics or propagates a transport error.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::ConnectionConfig;
use super::monitor::MonitorHandle;
use crate::application::reader::envelope::export_envelope;
use crate::application::reader::parse::parse;
use crate::application::reader::validate::{validate_data_type, validate_structure};
use crate::domain::{
    CompanyInfo, ConnectionStats, ConnectionStatus, DataType, FailureKind, GatewayResponse,
    RequestParams, StatsSnapshot,
};
use crate::error::{truncate_chars, ConfigError, ErrorKind, GatewayError};
use crate::port::{Event, HttpRequest, Notifier, Transport};

/// Body substring that identifies a running gateway.
pub const PROBE_SENTINEL: &str = "TallyPrime Server is Running";

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Outcome of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub success: bool,
    pub message: String,
    /// Transport classification when the probe failed on the wire.
    pub failure: Option<FailureKind>,
}

struct LinkState {
    config: ConnectionConfig,
    status: ConnectionStatus,
    stats: ConnectionStats,
    company: Option<CompanyInfo>,
    last_error: Option<String>,
}

/// Manages the link to one gateway.
///
/// Shared between interactive callers, executor workers and the monitoring
/// loop. All state sits behind one mutex that is never held across an
/// `.await`; events are emitted after the lock is released.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<LinkState>,
    pub(super) monitor: Mutex<Option<MonitorHandle>>,
}

impl ConnectionManager {
    /// Create a manager for a validated configuration.
    pub fn new(
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            transport,
            notifier,
            state: Mutex::new(LinkState {
                config,
                status: ConnectionStatus::Disconnected,
                stats: ConnectionStats::default(),
                company: None,
                last_error: None,
            }),
            monitor: Mutex::new(None),
        })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> ConnectionConfig {
        self.state.lock().config.clone()
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.state.lock().config.url()
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Company metadata from the last successful connectivity test.
    #[must_use]
    pub fn company_info(&self) -> Option<CompanyInfo> {
        self.state.lock().company.clone()
    }

    /// Message of the most recent failure.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        let state = self.state.lock();
        StatsSnapshot {
            total_requests: state.stats.total_requests,
            successful_requests: state.stats.successful_requests,
            success_rate: state.stats.success_rate(),
            last_response_time_ms: state.stats.last_response_time.as_millis(),
            current_status: state.status,
            url: state.config.url(),
        }
    }

    /// Zero the request counters.
    pub fn reset_stats(&self) {
        self.state.lock().stats = ConnectionStats::default();
        debug!("Connection statistics reset");
    }

    pub(super) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// POST an envelope to the gateway.
    ///
    /// Transient failures are retried up to `retry_count` attempts in total
    /// with a fixed delay. The counters are updated once per call whatever
    /// the outcome.
    pub async fn send_request(&self, envelope: &str, description: &str) -> GatewayResponse {
        let config = self.config();
        let request = HttpRequest::post(config.url(), envelope, config.timeout())
            .header("Content-Type", XML_CONTENT_TYPE)
            .header("User-Agent", config.user_agent.as_str());

        debug!(
            operation = description,
            url = %request.url,
            bytes = envelope.len(),
            "Sending gateway request"
        );

        let response = self.round_trip(request, &config).await;
        self.record(&response);

        if let (Some(kind), Some(message)) = (response.failure, response.error_message.as_ref()) {
            warn!(
                operation = description,
                kind = %kind,
                error = %message,
                "Gateway request failed"
            );
            self.notifier.notify(Event::ErrorOccurred {
                kind: kind.code().to_string(),
                message: format!("{description}: {message}"),
            });
        }
        response
    }

    /// Probe the gateway root and update the connection status.
    ///
    /// Emits CONNECTING, then the final status. On success the company
    /// metadata is fetched as well.
    pub async fn test_connection(&self) -> ProbeResult {
        self.probe(true).await
    }

    /// Run one probe.
    ///
    /// A loud probe announces every status it passes through. A quiet probe
    /// (monitoring) only emits when the final status differs from the status
    /// before the probe.
    pub(super) async fn probe(&self, loud: bool) -> ProbeResult {
        let previous = self.status();
        let config = self.config();
        let url = config.url();

        if self.apply_status(ConnectionStatus::Connecting) && loud {
            self.emit_status(ConnectionStatus::Connecting, format!("Connecting to {url}"));
        }

        let request = HttpRequest::get(url.clone(), config.timeout())
            .header("User-Agent", config.user_agent.as_str());
        let response = self.round_trip(request, &config).await;
        self.record(&response);

        let reachable = response.success && response.body.contains(PROBE_SENTINEL);
        let result = if reachable {
            let company = if loud || previous != ConnectionStatus::Connected {
                self.fetch_company_info().await
            } else {
                self.company_info()
            };
            let message = match &company {
                Some(info) => format!("Connected to {}", info.name),
                None => format!("Connected to gateway at {url}"),
            };
            self.state.lock().last_error = None;
            ProbeResult {
                success: true,
                message,
                failure: None,
            }
        } else {
            let message = match &response.error_message {
                Some(err) => format!("Cannot reach gateway at {url}: {err}"),
                None => format!("Service at {url} is not a TallyPrime gateway"),
            };
            self.state.lock().last_error = Some(message.clone());
            ProbeResult {
                success: false,
                message,
                failure: response.failure,
            }
        };

        let next = match (result.success, result.failure) {
            (true, _) => ConnectionStatus::Connected,
            (false, Some(FailureKind::Timeout)) => ConnectionStatus::Timeout,
            (false, _) => ConnectionStatus::Error,
        };
        let changed = self.apply_status(next);
        if changed && (loud || next != previous) {
            self.emit_status(next, result.message.clone());
            if !result.success {
                let kind = result.failure.map_or("NOT_TALLY", FailureKind::code);
                self.notifier.notify(Event::ErrorOccurred {
                    kind: kind.to_string(),
                    message: result.message.clone(),
                });
            }
        }

        if result.success {
            info!(url = %url, message = %result.message, "Gateway probe succeeded");
        } else {
            warn!(url = %url, message = %result.message, "Gateway probe failed");
        }
        result
    }

    /// Request company metadata; best effort.
    pub async fn fetch_company_info(&self) -> Option<CompanyInfo> {
        let envelope = match export_envelope(DataType::CompanyInfo, &RequestParams::new()) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "Cannot build company info request");
                return None;
            }
        };

        let response = self.send_request(&envelope, "Company Info").await;
        if !response.success {
            return None;
        }

        let info = match read_company(&response.body) {
            Ok(info) => info,
            Err(err) => {
                warn!(kind = %err.kind, error = %err.message, "Company info reply rejected");
                self.notifier.notify(Event::ErrorOccurred {
                    kind: err.kind.code().to_string(),
                    message: format!("Company Info: {}", err.message),
                });
                return None;
            }
        };
        self.state.lock().company = Some(info.clone());
        info!(company = %info.name, "Company info retrieved");
        self.notifier
            .notify(Event::CompanyInfoReceived(info.clone()));
        Some(info)
    }

    /// Replace the configuration wholesale.
    ///
    /// A new host or port drops the link back to DISCONNECTED and forgets
    /// the company.
    pub fn update_config(&self, config: ConnectionConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let message = format!("Settings updated: {}:{}", config.host, config.port);

        let status = {
            let mut state = self.state.lock();
            let retargeted = state.config.targets_differ(&config);
            state.config = config;
            if retargeted {
                state.status = ConnectionStatus::Disconnected;
                state.company = None;
            }
            state.status
        };

        info!(message = %message, "Connection configuration replaced");
        self.emit_status(status, message);
        Ok(())
    }

    /// Stop monitoring and force DISCONNECTED.
    pub fn disconnect(&self) {
        self.stop_monitoring();
        let changed = {
            let mut state = self.state.lock();
            let changed = state.status != ConnectionStatus::Disconnected;
            state.status = ConnectionStatus::Disconnected;
            state.company = None;
            changed
        };
        if changed {
            self.emit_status(ConnectionStatus::Disconnected, "Disconnected".to_string());
        }
    }

    /// Perform the HTTP exchange with bounded fixed-delay retries.
    async fn round_trip(&self, request: HttpRequest, config: &ConnectionConfig) -> GatewayResponse {
        let started = Instant::now();
        let max_attempts = config.retry_count.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let (kind, message, reply) = match self.transport.send(request.clone()).await {
                Ok(reply) if reply.is_success() => {
                    return GatewayResponse::ok(
                        reply.status,
                        reply.body,
                        reply.content_type,
                        started.elapsed(),
                    );
                }
                Ok(reply) => {
                    let kind = FailureKind::HttpError(reply.status);
                    let detail = truncate_chars(reply.body.trim(), 200);
                    let message = if detail.is_empty() {
                        format!("HTTP {}", reply.status)
                    } else {
                        format!("HTTP {}: {detail}", reply.status)
                    };
                    (kind, message, Some(reply))
                }
                Err(err) => (err.kind, err.message, None),
            };

            if attempt >= max_attempts || !kind.is_transient() {
                let mut response = GatewayResponse::failed(kind, message, started.elapsed());
                if let Some(reply) = reply {
                    response.body = reply.body;
                    response.content_type = reply.content_type;
                }
                return response;
            }

            warn!(
                attempt,
                max_attempts,
                kind = %kind,
                error = %message,
                delay_ms = config.retry_delay_ms,
                "Gateway request failed, retrying"
            );
            tokio::time::sleep(config.retry_delay()).await;
        }
    }

    fn record(&self, response: &GatewayResponse) {
        let mut state = self.state.lock();
        state.stats.record(response.success, response.response_time);
        if let Some(message) = &response.error_message {
            state.last_error = Some(message.clone());
        }
    }

    /// Move to `next` if the state machine allows it. Returns whether the
    /// status changed.
    fn apply_status(&self, next: ConnectionStatus) -> bool {
        let mut state = self.state.lock();
        if state.status == next {
            return false;
        }
        if !state.status.can_transition_to(next) {
            debug!(from = %state.status, to = %next, "Ignoring illegal status transition");
            return false;
        }
        state.status = next;
        true
    }

    fn emit_status(&self, status: ConnectionStatus, message: String) {
        self.notifier
            .notify(Event::StatusChanged { status, message });
    }
}

/// Run a company-info reply through the reader's validation chain.
fn read_company(body: &str) -> Result<CompanyInfo, GatewayError> {
    let root = parse(body)?;
    validate_structure(&root)?;
    validate_data_type(&root, DataType::CompanyInfo)?;
    CompanyInfo::from_xml(&root).ok_or_else(|| {
        GatewayError::new(
            ErrorKind::MissingData(DataType::CompanyInfo),
            "Company name missing from response",
        )
        .with_content(body)
    })
}
