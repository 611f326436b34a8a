//! Discovery of gateway instances on candidate host/port pairs.

use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info};

use super::config::DiscoveryConfig;
use super::manager::{ConnectionManager, PROBE_SENTINEL};
use crate::port::{HttpRequest, Transport};

/// A gateway instance that answered a discovery probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredInstance {
    pub host: String,
    pub port: u16,
}

impl DiscoveredInstance {
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Probe each candidate once and keep the ones running the gateway.
///
/// Probes run concurrently with a short timeout and no retries. Failures
/// are logged at debug level and never returned. Results keep candidate
/// order.
pub async fn discover(
    transport: &dyn Transport,
    candidates: &[(String, u16)],
    probe_timeout: Duration,
) -> Vec<DiscoveredInstance> {
    let probes = candidates.iter().map(|(host, port)| async move {
        let url = format!("http://{host}:{port}/");
        match transport.send(HttpRequest::get(url, probe_timeout)).await {
            Ok(reply) if reply.is_success() && reply.body.contains(PROBE_SENTINEL) => {
                Some(DiscoveredInstance {
                    host: host.clone(),
                    port: *port,
                })
            }
            Ok(reply) => {
                debug!(host = %host, port, status = reply.status, "Candidate is not a gateway");
                None
            }
            Err(err) => {
                debug!(host = %host, port, kind = %err.kind, "Candidate unreachable");
                None
            }
        }
    });

    let found: Vec<DiscoveredInstance> = join_all(probes).await.into_iter().flatten().collect();
    info!(
        candidates = candidates.len(),
        found = found.len(),
        "Gateway discovery finished"
    );
    found
}

impl ConnectionManager {
    /// Probe explicit candidates with the discovery timeout.
    pub async fn discover_instances(
        &self,
        candidates: &[(String, u16)],
        probe_timeout: Duration,
    ) -> Vec<DiscoveredInstance> {
        discover(self.transport().as_ref(), candidates, probe_timeout).await
    }

    /// Probe the configured discovery candidates plus the current host.
    pub async fn discover_default(&self, discovery: &DiscoveryConfig) -> Vec<DiscoveredInstance> {
        let host = self.config().host;
        let candidates = discovery.candidates(Some(&host));
        self.discover_instances(&candidates, discovery.probe_timeout())
            .await
    }
}
