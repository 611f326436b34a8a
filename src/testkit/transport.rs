//! Scripted [`Transport`] for tests.
//!
//! Each call pops the next scripted outcome; when the script runs out the
//! fallback is used (a connection-refused failure unless set).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::FailureKind;
use crate::port::{HttpReply, HttpRequest, Transport, TransportError};

type Outcome = Result<HttpReply, TransportError>;

/// A transport that replays pre-loaded outcomes and records requests.
///
/// Cloning shares the script and the request log.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    fallback: Arc<Mutex<Outcome>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(Err(TransportError::new(
                FailureKind::ConnectionRefused,
                "connection refused (script exhausted)",
            )))),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Queue a 200 reply.
    #[must_use]
    pub fn ok(self, body: impl Into<String>) -> Self {
        self.reply(200, body)
    }

    /// Queue a reply with the given status.
    #[must_use]
    pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(HttpReply {
            status,
            body: body.into(),
            content_type: Some("text/xml".to_string()),
        }));
        self
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn fail(self, kind: FailureKind, message: impl Into<String>) -> Self {
        self.push(Err(TransportError::new(kind, message)));
        self
    }

    /// Outcome used once the script is exhausted.
    #[must_use]
    pub fn otherwise_ok(self, body: impl Into<String>) -> Self {
        *self.fallback.lock() = Ok(HttpReply {
            status: 200,
            body: body.into(),
            content_type: Some("text/xml".to_string()),
        });
        self
    }

    /// Sleep this long inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Append an outcome to the script.
    pub fn push(&self, outcome: Result<HttpReply, TransportError>) {
        self.script.lock().push_back(outcome);
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scripted outcomes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().pop_front();
        match next {
            Some(outcome) => outcome,
            None => self.fallback.lock().clone(),
        }
    }
}
