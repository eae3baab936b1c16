// ── Connection watchdog ──
//
// Background task that keeps the gateway connection healthy. After a
// grace delay it ticks on a fixed interval: when disconnected or degraded
// it makes one reconnection attempt, when connected it makes one liveness
// call. Past `failure_threshold` consecutive failures the interval doubles
// per extra failure up to `max_interval`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WatchdogConfig;
use crate::supervisor::{Supervisor, millis};

/// Wait before the next tick given the consecutive failure count.
///
/// The ceiling never drops below `base`, so escalation cannot shorten the wait.
pub fn next_interval(base: Duration, failures: u32, threshold: u32, max: Duration) -> Duration {
    if failures <= threshold {
        return base;
    }
    let max = max.max(base);
    2u32.checked_pow(failures - threshold)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(max, |d| d.min(max))
}

/// Handle to a running watchdog.
pub struct WatchdogHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    failures: Arc<AtomicU32>,
    config: WatchdogConfig,
}

impl WatchdogHandle {
    /// Consecutive failed ticks so far.
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Wait the watchdog will use after the current tick.
    pub fn current_interval(&self) -> Duration {
        next_interval(
            self.config.interval,
            self.failures(),
            self.config.failure_threshold,
            self.config.max_interval,
        )
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "watchdog task ended abnormally");
        }
    }
}

/// Periodic health checker for one supervisor.
pub struct Watchdog {
    supervisor: Supervisor,
    config: WatchdogConfig,
    failures: Arc<AtomicU32>,
}

impl Watchdog {
    /// Start the loop on the current runtime.
    ///
    /// The loop also stops when the supervisor shuts down.
    pub fn spawn(supervisor: Supervisor, config: WatchdogConfig) -> WatchdogHandle {
        let cancel = supervisor.child_token();
        let failures = Arc::new(AtomicU32::new(0));
        let watchdog = Self {
            supervisor,
            config: config.clone(),
            failures: Arc::clone(&failures),
        };

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            watchdog.run(task_cancel).await;
        });

        WatchdogHandle {
            cancel,
            task,
            failures,
            config,
        }
    }

    async fn run(self, cancel: CancellationToken) {
        debug!(grace_ms = millis(self.config.grace), "watchdog started");
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(self.config.grace) => {}
        }

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.tick() => {}
            }

            let wait = next_interval(
                self.config.interval,
                self.failures.load(Ordering::Relaxed),
                self.config.failure_threshold,
                self.config.max_interval,
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }

        debug!("watchdog stopped");
    }

    async fn tick(&self) {
        let state = self.supervisor.state();
        debug!(state = %state, failures = self.failures.load(Ordering::Relaxed), "watchdog tick");

        if self.supervisor.is_connected() {
            if self.supervisor.check_liveness().await {
                self.failures.store(0, Ordering::Relaxed);
            } else {
                self.record_failure("liveness check failed");
            }
            return;
        }

        if self.supervisor.connect().await {
            let previous = self.failures.swap(0, Ordering::Relaxed);
            info!(previous_failures = previous, "watchdog reconnected to gateway");
        } else {
            self.record_failure("reconnection failed");
        }
    }

    fn record_failure(&self, what: &str) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        let next = next_interval(
            self.config.interval,
            failures,
            self.config.failure_threshold,
            self.config.max_interval,
        );
        warn!(failures, next_interval_secs = next.as_secs(), "watchdog: {what}");
    }
}
