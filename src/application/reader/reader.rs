//! The response reader: request, validate, cache, report.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clean::{clean, sanitize};
use super::config::ReaderConfig;
use super::envelope::{export_envelope, import_envelope};
use super::parse::parse_xml;
use super::posting::{interpret_import_reply, validate_voucher};
use super::tabular::parse_report_lines;
use super::validate::{validate_data_type, validate_structure};
use crate::application::cache::{CacheConfig, CacheStats, DataCache};
use crate::application::connection::ConnectionManager;
use crate::domain::{
    CachedResponse, CompanyInfo, DataType, ExportFormat, GatewayResponse, Payload,
    PostingErrorKind, PostingResult, RequestParams,
};
use crate::error::{ErrorKind, ErrorReport, GatewayError};
use crate::port::{Event, Notifier};

/// Running counters of the reader. Never reset implicitly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReaderStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub parse_errors: u64,
    pub validation_errors: u64,
    pub malformed_responses: u64,
    /// Network time of successful gateway round trips.
    pub total_response_time_ms: u64,
    pub cache: Option<CacheStats>,
}

impl ReaderStats {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }

    /// Mean response time of requests that reached the gateway.
    #[must_use]
    pub fn average_response_time(&self) -> Duration {
        let network = self.successful_requests.saturating_sub(self.cache_hits);
        if network == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.total_response_time_ms / network)
    }
}

struct Diagnostics {
    stats: ReaderStats,
    recent: VecDeque<ErrorReport>,
}

/// Builds requests per data type, issues them through the connection
/// manager and turns raw replies into validated payloads.
pub struct ResponseReader {
    connection: Arc<ConnectionManager>,
    cache: Option<DataCache<CachedResponse>>,
    notifier: Arc<dyn Notifier>,
    recent_capacity: usize,
    diagnostics: Mutex<Diagnostics>,
}

impl ResponseReader {
    pub fn new(
        connection: Arc<ConnectionManager>,
        cache: &CacheConfig,
        config: &ReaderConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cache = cache.enabled.then(|| DataCache::from_config(cache));
        let recent_capacity = config.recent_error_capacity.max(1);
        Self {
            connection,
            cache,
            notifier,
            recent_capacity,
            diagnostics: Mutex::new(Diagnostics {
                stats: ReaderStats::default(),
                recent: VecDeque::with_capacity(recent_capacity),
            }),
        }
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    /// Request one data type.
    ///
    /// Served from the cache unless `force_refresh` is set. Never fails:
    /// transport and validation problems come back as an unsuccessful
    /// response with `error` set.
    pub async fn request(
        &self,
        data_type: DataType,
        params: &RequestParams,
        force_refresh: bool,
    ) -> GatewayResponse {
        let operation = data_type.operation_name();
        self.diagnostics.lock().stats.total_requests += 1;

        if !force_refresh {
            if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(data_type, params)) {
                {
                    let mut diag = self.diagnostics.lock();
                    diag.stats.cache_hits += 1;
                    diag.stats.successful_requests += 1;
                }
                debug!(data_type = %data_type, "Serving response from cache");
                let response = GatewayResponse::cached(hit);
                self.emit_data(&operation, &response);
                return response;
            }
        }

        let envelope = match export_envelope(data_type, params) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.record_failure(&err);
                self.emit_error(&err);
                return GatewayResponse::invalid(err);
            }
        };

        let mut response = self.connection.send_request(&envelope, &operation).await;
        if !response.success {
            // Already reported as an error event by the connection manager.
            let kind = response
                .failure
                .map_or(ErrorKind::RequestFailed, ErrorKind::from);
            let message = response
                .error_message
                .clone()
                .unwrap_or_else(|| format!("{operation} request failed"));
            let err = GatewayError::new(kind, message);
            self.record_failure(&err);
            response.error = Some(err);
            return response;
        }

        match interpret(data_type, &response.body) {
            Ok(payload) => {
                if let Some(cache) = &self.cache {
                    cache.put(
                        data_type,
                        params,
                        CachedResponse {
                            body: response.body.clone(),
                            content_type: response.content_type.clone(),
                            payload: payload.clone(),
                        },
                        data_type.ttl(),
                    );
                }
                {
                    let mut diag = self.diagnostics.lock();
                    diag.stats.successful_requests += 1;
                    diag.stats.total_response_time_ms +=
                        u64::try_from(response.response_time.as_millis()).unwrap_or(u64::MAX);
                }
                let response = response.with_payload(payload);
                info!(
                    data_type = %data_type,
                    items = response.payload.as_ref().map_or(0, Payload::item_count),
                    elapsed_ms = response.response_time.as_millis() as u64,
                    "Gateway data received"
                );
                self.emit_data(&operation, &response);
                response
            }
            Err(err) => {
                warn!(
                    data_type = %data_type,
                    kind = %err.kind,
                    error = %err.message,
                    "Gateway reply rejected"
                );
                self.record_failure(&err);
                self.emit_error(&err);
                response.into_rejected(err)
            }
        }
    }

    /// Like [`request`](Self::request) but yields the payload or the
    /// classified error.
    pub async fn fetch(
        &self,
        data_type: DataType,
        params: &RequestParams,
    ) -> Result<Payload, GatewayError> {
        into_payload(self.request(data_type, params, false).await)
    }

    /// Non-raising variant of [`fetch`](Self::fetch).
    pub async fn try_fetch(&self, data_type: DataType, params: &RequestParams) -> Option<Payload> {
        self.fetch(data_type, params).await.ok()
    }

    /// Company metadata of the open company.
    pub async fn company_info(&self) -> Result<CompanyInfo, GatewayError> {
        let payload = self
            .fetch(DataType::CompanyInfo, &RequestParams::new())
            .await?;
        payload
            .as_document()
            .and_then(CompanyInfo::from_xml)
            .ok_or_else(|| {
                GatewayError::new(
                    ErrorKind::MissingData(DataType::CompanyInfo),
                    "Company information missing from response",
                )
            })
    }

    /// Ledger names from the accounts list report.
    pub async fn ledger_names(&self) -> Result<Vec<String>, GatewayError> {
        self.report_lines(DataType::LedgerNames).await
    }

    /// Group names from the groups list report.
    pub async fn group_names(&self) -> Result<Vec<String>, GatewayError> {
        self.report_lines(DataType::GroupNames).await
    }

    async fn report_lines(&self, data_type: DataType) -> Result<Vec<String>, GatewayError> {
        let payload = self.fetch(data_type, &RequestParams::new()).await?;
        Ok(payload.as_report().map(<[String]>::to_vec).unwrap_or_default())
    }

    /// Import a voucher.
    ///
    /// `voucher_xml` is the `VOUCHER` element; it is wrapped in the Import
    /// Data envelope here.
    pub async fn post_voucher(&self, voucher_xml: &str, description: &str) -> PostingResult {
        self.diagnostics.lock().stats.total_requests += 1;
        let envelope = import_envelope(voucher_xml);
        let response = self.connection.send_request(&envelope, description).await;

        let result = if response.success {
            interpret_import_reply(&response.body, response.response_time)
        } else {
            let message = response
                .error_message
                .unwrap_or_else(|| "Voucher import request failed".to_string());
            PostingResult {
                response_time: response.response_time,
                ..PostingResult::failure(PostingErrorKind::NetworkError, message)
            }
        };

        {
            let mut diag = self.diagnostics.lock();
            if result.success {
                diag.stats.successful_requests += 1;
            } else {
                diag.stats.failed_requests += 1;
            }
        }

        if result.success {
            info!(
                description,
                voucher_id = result.voucher_id.as_deref().unwrap_or("-"),
                "Voucher posted"
            );
        } else {
            warn!(
                description,
                kind = %result.error_kind.unwrap_or(PostingErrorKind::UnknownError),
                error = result.error_message.as_deref().unwrap_or_default(),
                "Voucher posting failed"
            );
        }
        self.notifier.notify(Event::VoucherPosted(result.clone()));
        result
    }

    /// Validate locally first; an invalid voucher is never sent.
    pub async fn post_voucher_validated(&self, voucher_xml: &str, description: &str) -> PostingResult {
        let validation = validate_voucher(voucher_xml);
        for warning in &validation.warnings {
            warn!(description, warning = %warning, "Voucher validation warning");
        }
        if !validation.is_valid() {
            let result = PostingResult {
                error_details: validation.issues.clone(),
                ..PostingResult::failure(
                    PostingErrorKind::ValidationError,
                    format!("Voucher validation failed: {}", validation.issues.join("; ")),
                )
            };
            self.notifier.notify(Event::VoucherPosted(result.clone()));
            return result;
        }
        self.post_voucher(voucher_xml, description).await
    }

    /// Most recent errors, oldest first.
    #[must_use]
    pub fn recent_errors(&self) -> Vec<ErrorReport> {
        self.diagnostics.lock().recent.iter().cloned().collect()
    }

    #[must_use]
    pub fn statistics(&self) -> ReaderStats {
        let mut stats = self.diagnostics.lock().stats.clone();
        stats.cache = self.cache.as_ref().map(DataCache::stats);
        stats
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            info!("Response cache cleared");
        }
    }

    /// Drop stale cache entries; returns how many were removed.
    pub fn cleanup_expired_cache(&self) -> usize {
        self.cache.as_ref().map_or(0, DataCache::cleanup_expired)
    }

    fn record_failure(&self, err: &GatewayError) {
        let mut diag = self.diagnostics.lock();
        diag.stats.failed_requests += 1;
        match err.kind {
            ErrorKind::ParseError => diag.stats.parse_errors += 1,
            ErrorKind::EmptyContent
            | ErrorKind::InvalidXmlStart
            | ErrorKind::HtmlResponse
            | ErrorKind::JsonResponse => diag.stats.malformed_responses += 1,
            kind if kind.is_validation() => diag.stats.validation_errors += 1,
            _ => {}
        }
        if diag.recent.len() == self.recent_capacity {
            diag.recent.pop_front();
        }
        diag.recent.push_back(err.debug_info());
    }

    fn emit_error(&self, err: &GatewayError) {
        self.notifier.notify(Event::ErrorOccurred {
            kind: err.kind.code().to_string(),
            message: err.message.clone(),
        });
    }

    fn emit_data(&self, operation: &str, response: &GatewayResponse) {
        if let Some(payload) = &response.payload {
            self.notifier.notify(Event::DataReceived {
                operation: operation.to_string(),
                payload: payload.clone(),
            });
        }
    }
}

/// Validate a successful reply body for `data_type`.
fn interpret(data_type: DataType, body: &str) -> Result<Payload, GatewayError> {
    match data_type.export_format() {
        ExportFormat::Xml => {
            let root = parse_xml(&clean(body)?)?;
            validate_structure(&root)?;
            validate_data_type(&root, data_type)?;
            Ok(Payload::Document(Arc::new(root)))
        }
        ExportFormat::Ascii => {
            let text = sanitize(body)?;
            // Markup is never a report; surface its embedded error if it has one.
            if text.starts_with('<') {
                let root = parse_xml(&text)?;
                validate_structure(&root)?;
                return Err(GatewayError::new(
                    ErrorKind::MissingData(data_type),
                    "Expected a text report but received XML",
                )
                .with_content(&text));
            }
            Ok(Payload::Report(parse_report_lines(&text).into()))
        }
    }
}

fn into_payload(response: GatewayResponse) -> Result<Payload, GatewayError> {
    match (response.success, response.payload) {
        (true, Some(payload)) => Ok(payload),
        _ => Err(response.error.unwrap_or_else(|| {
            let kind = response
                .failure
                .map_or(ErrorKind::RequestFailed, ErrorKind::from);
            GatewayError::new(
                kind,
                response
                    .error_message
                    .unwrap_or_else(|| "Request failed".to_string()),
            )
        })),
    }
}
