//! Periodic re-probing of the gateway.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::manager::ConnectionManager;

/// Running monitoring loop.
pub(super) struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    interval: Duration,
}

impl MonitorHandle {
    fn stop(self) {
        self.token.cancel();
        self.task.abort();
    }
}

impl ConnectionManager {
    /// Re-probe the gateway every `interval`.
    ///
    /// A status-changed event is emitted only when a probe ends in a
    /// different status than the one before it. Restarting replaces the
    /// previous loop. Must be called inside a tokio runtime.
    pub fn start_monitoring(self: &Arc<Self>, interval: Duration) {
        let interval = interval.max(Duration::from_millis(10));
        let token = CancellationToken::new();
        let weak: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(monitor_loop(weak, interval, token.clone()));

        let previous = self.monitor.lock().replace(MonitorHandle {
            token,
            task,
            interval,
        });
        if let Some(previous) = previous {
            previous.stop();
        }
        info!(interval_ms = interval.as_millis() as u64, "Connection monitoring started");
    }

    /// Stop the monitoring loop if one is running.
    pub fn stop_monitoring(&self) {
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            handle.stop();
            info!("Connection monitoring stopped");
        }
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    /// Interval of the running monitoring loop.
    #[must_use]
    pub fn monitoring_interval(&self) -> Option<Duration> {
        self.monitor.lock().as_ref().map(|handle| handle.interval)
    }
}

async fn monitor_loop(manager: Weak<ConnectionManager>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(manager) = manager.upgrade() else {
            debug!("Connection manager dropped, monitoring ends");
            break;
        };

        tokio::select! {
            () = token.cancelled() => break,
            result = manager.probe(false) => {
                if !result.success {
                    warn!(message = %result.message, "Monitoring probe failed");
                }
            }
        }
    }
}
