//! Ready-made workers for the gateway operations.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::context::TaskContext;
use super::worker::Worker;
use crate::application::connection::ConnectionManager;
use crate::application::reader::ResponseReader;
use crate::domain::{DataType, Payload, RequestParams, TaskPriority};

/// Probe the gateway.
pub struct ConnectionTestJob {
    connection: Arc<ConnectionManager>,
}

impl ConnectionTestJob {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Worker for ConnectionTestJob {
    fn name(&self) -> String {
        "Test Connection".to_string()
    }

    fn priority(&self) -> TaskPriority {
        TaskPriority::High
    }

    async fn execute(&self, ctx: TaskContext) -> anyhow::Result<Value> {
        ctx.report_progress(10, format!("Probing {}", self.connection.url()));
        let probe = self.connection.test_connection().await;
        if !probe.success {
            bail!(probe.message);
        }
        ctx.report_progress(100, probe.message.clone());
        Ok(json!({
            "message": probe.message,
            "company": self.connection.company_info(),
        }))
    }
}

/// Load one data type through the reader, connecting first if needed.
pub struct DataLoadJob {
    reader: Arc<ResponseReader>,
    data_type: DataType,
    params: RequestParams,
    force_refresh: bool,
}

impl DataLoadJob {
    pub fn new(reader: Arc<ResponseReader>, data_type: DataType, params: RequestParams) -> Self {
        Self {
            reader,
            data_type,
            params,
            force_refresh: false,
        }
    }

    #[must_use]
    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

#[async_trait]
impl Worker for DataLoadJob {
    fn name(&self) -> String {
        format!("Load {}", self.data_type.operation_name())
    }

    async fn execute(&self, ctx: TaskContext) -> anyhow::Result<Value> {
        let connection = self.reader.connection();
        if !connection.is_connected() {
            ctx.report_progress(5, "Connecting to gateway");
            let probe = connection.test_connection().await;
            if !probe.success {
                bail!(probe.message);
            }
        }
        if ctx.is_cancelled() {
            return Ok(Value::Null);
        }

        ctx.report_progress(30, format!("Requesting {}", self.data_type.operation_name()));
        let response = self
            .reader
            .request(self.data_type, &self.params, self.force_refresh)
            .await;
        if ctx.is_cancelled() {
            return Ok(Value::Null);
        }

        ctx.report_progress(90, "Processing response");
        let payload = match (response.success, response.payload) {
            (true, Some(payload)) => payload,
            _ => {
                return Err(match response.error {
                    Some(err) => err.into(),
                    None => anyhow!(response
                        .error_message
                        .unwrap_or_else(|| "request failed".to_string())),
                });
            }
        };

        ctx.report_progress(100, "Done");
        Ok(json!({
            "data_type": self.data_type,
            "from_cache": response.from_cache,
            "response_time_ms": response.response_time.as_millis() as u64,
            "items": payload.item_count(),
            "payload": payload_value(&payload)?,
        }))
    }
}

fn payload_value(payload: &Payload) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

/// Import one voucher.
pub struct PostVoucherJob {
    reader: Arc<ResponseReader>,
    voucher_xml: String,
    description: String,
    validate_first: bool,
}

impl PostVoucherJob {
    pub fn new(
        reader: Arc<ResponseReader>,
        voucher_xml: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            voucher_xml: voucher_xml.into(),
            description: description.into(),
            validate_first: true,
        }
    }

    /// Skip the local pre-validation.
    #[must_use]
    pub fn unvalidated(mut self) -> Self {
        self.validate_first = false;
        self
    }
}

#[async_trait]
impl Worker for PostVoucherJob {
    fn name(&self) -> String {
        format!("Post {}", self.description)
    }

    fn priority(&self) -> TaskPriority {
        TaskPriority::High
    }

    async fn execute(&self, ctx: TaskContext) -> anyhow::Result<Value> {
        ctx.report_progress(10, "Posting voucher");
        let result = if self.validate_first {
            self.reader
                .post_voucher_validated(&self.voucher_xml, &self.description)
                .await
        } else {
            self.reader
                .post_voucher(&self.voucher_xml, &self.description)
                .await
        };
        if !result.success {
            bail!(result.summary());
        }
        ctx.report_progress(100, result.summary());
        Ok(serde_json::to_value(&result)?)
    }
}
