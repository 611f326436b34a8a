//! Connection and discovery configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// How to reach the gateway.
///
/// Built once and validated; a change is applied by handing a whole new
/// value to [`ConnectionManager::update_config`](super::ConnectionManager::update_config).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request deadline (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Attempts per request, the first one included.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Fixed pause between attempts (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Identifying `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    9000
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_retry_count() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_user_agent() -> String {
    concat!("tallybridge/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Gateway root, e.g. `http://localhost:9000/`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Whether `other` points at a different gateway.
    #[must_use]
    pub fn targets_differ(&self, other: &Self) -> bool {
        self.host != other.host || self.port != other.port
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "host" });
        }
        url::Url::parse(&self.url()).map_err(|e| ConfigError::InvalidValue {
            field: "host",
            reason: e.to_string(),
        })?;
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.retry_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_count",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Candidate set and deadline for instance discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_discovery_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_discovery_ports")]
    pub ports: Vec<u16>,
    /// Per-candidate probe deadline (milliseconds).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_discovery_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

fn default_discovery_ports() -> Vec<u16> {
    vec![9000, 9001, 9002, 8000, 8080, 9999]
}

const fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            hosts: default_discovery_hosts(),
            ports: default_discovery_ports(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl DiscoveryConfig {
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Every host × port pair, with `extra_host` added and duplicates removed.
    #[must_use]
    pub fn candidates(&self, extra_host: Option<&str>) -> Vec<(String, u16)> {
        let mut hosts: Vec<&str> = Vec::new();
        for host in self.hosts.iter().map(String::as_str).chain(extra_host) {
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }
        hosts
            .into_iter()
            .flat_map(|host| self.ports.iter().map(move |&port| (host.to_string(), port)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ports.is_empty() {
            return Err(ConfigError::MissingField {
                field: "discovery.ports",
            });
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.probe_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
