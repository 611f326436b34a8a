//! Connection status state machine and request statistics.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Connection state of the gateway link.
///
/// Probe-driven transitions:
///
/// ```text
/// Disconnected | Error | Timeout | Connected --> Connecting
/// Connecting --> Connected | Error | Timeout
/// ```
///
/// Explicit caller actions (disconnect, re-targeting the connection) may
/// move any state back to `Disconnected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
    Timeout,
}

impl ConnectionStatus {
    /// Whether a probe may move the link from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, next),
            (Disconnected | Error | Timeout | Connected, Connecting)
                | (Connecting, Connected | Error | Timeout)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running request counters. Only reset by an explicit caller action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub last_response_time: Duration,
}

impl ConnectionStats {
    pub fn record(&mut self, success: bool, response_time: Duration) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        }
        self.last_response_time = response_time;
    }

    /// Success percentage in `0.0..=100.0`, rounded to two decimals.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        let rate = self.successful_requests as f64 / self.total_requests as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

/// Point-in-time view of the connection for observability.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub success_rate: f64,
    pub last_response_time_ms: u128,
    pub current_status: ConnectionStatus,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionStatus::*;

    #[test]
    fn probe_transitions_follow_the_state_machine() {
        for from in [Disconnected, Error, Timeout, Connected] {
            assert!(from.can_transition_to(Connecting), "{from} -> connecting");
        }
        for to in [Connected, Error, Timeout] {
            assert!(Connecting.can_transition_to(to));
        }
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Error));
        assert!(!Error.can_transition_to(Timeout));
        assert!(!Connecting.can_transition_to(Connecting));
    }

    #[test]
    fn success_rate_is_rounded_percentage() {
        let mut stats = ConnectionStats::default();
        assert_eq!(stats.success_rate(), 0.0);

        stats.record(true, Duration::from_millis(5));
        stats.record(false, Duration::from_millis(7));
        stats.record(false, Duration::from_millis(9));

        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.success_rate(), 33.33);
        assert_eq!(stats.last_response_time, Duration::from_millis(9));
    }
}
