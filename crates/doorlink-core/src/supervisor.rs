// ── Connection supervisor ──
//
// Owns the single gateway link and the connection state machine:
//
//   Disconnected → Connecting → Connected → Degraded → (reconnect | Disconnected)
//
// Transitions (connect, disconnect, one retry attempt) are serialized by
// an async mutex. The link itself sits in an `ArcSwapOption` so the
// executor can load it without touching that mutex. Every installed link
// gets a generation number; failure reports carrying an older generation
// are ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use doorlink_api::error::is_transport_code;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{CertificateOverride, ConnectionSettings};
use crate::error::CoreError;
use crate::link::{Connector, GatewayLink};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Was connected; the last call or health check failed.
    Degraded,
}

/// The installed link plus the generation it was installed under.
#[derive(Clone)]
pub struct ActiveLink {
    pub link: Arc<dyn GatewayLink>,
    pub generation: u64,
}

// ── Supervisor ───────────────────────────────────────────────────

/// Lifecycle manager for the gateway connection.
///
/// Cheaply cloneable via `Arc<SupervisorInner>`; one instance per gateway,
/// injected wherever the connection is needed.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    settings: ConnectionSettings,
    connector: Arc<dyn Connector>,
    link: ArcSwapOption<ActiveLink>,
    next_generation: AtomicU64,
    state: watch::Sender<ConnectionState>,
    /// Mirrors `state == Connected`; only sent when the value flips.
    status: watch::Sender<bool>,
    transition: Mutex<()>,
    cancel: CancellationToken,
}

impl Supervisor {
    /// Create a supervisor. Does NOT connect.
    ///
    /// Credential files named by `settings` are checked here; a missing or
    /// unreadable file is the one failure that is returned instead of
    /// logged.
    pub fn new(
        settings: ConnectionSettings,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, CoreError> {
        settings.transport(None)?.validate()?;

        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (status, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(SupervisorInner {
                settings,
                connector,
                link: ArcSwapOption::empty(),
                next_generation: AtomicU64::new(1),
                state,
                status,
                transition: Mutex::new(()),
                cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    // ── Observation ──────────────────────────────────────────────

    /// True only in [`ConnectionState::Connected`].
    pub fn is_connected(&self) -> bool {
        *self.inner.state.borrow() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Every state transition.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Fires only when [`is_connected`](Self::is_connected) flips.
    ///
    /// Replacing a connected link through
    /// [`connect_secure`](Self::connect_secure) fires only if the new link
    /// fails.
    pub fn subscribe_status(&self) -> watch::Receiver<bool> {
        self.inner.status.subscribe()
    }

    /// The installed link, if any. Callers keep the clone for one call only.
    pub fn current_link(&self) -> Option<Arc<ActiveLink>> {
        self.inner.link.load_full()
    }

    /// Child of the root token; cancelled by [`shutdown`](Self::shutdown).
    pub fn child_token(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// One connection attempt with the configured settings.
    ///
    /// Returns `true` immediately if already connected.
    pub async fn connect(&self) -> bool {
        let _transition = self.inner.transition.lock().await;
        if self.is_connected() {
            debug!("already connected");
            return true;
        }
        self.connect_locked(None).await
    }

    /// One connection attempt with a one-shot certificate override.
    ///
    /// Always replaces the current link; the stored settings are untouched.
    pub async fn connect_secure(&self, cert_override: CertificateOverride) -> bool {
        let _transition = self.inner.transition.lock().await;
        self.connect_locked(Some(&cert_override)).await
    }

    /// Up to `max_attempts` connection attempts with exponential backoff.
    ///
    /// The transition lock is held per attempt, never across the sleep.
    pub async fn connect_with_retry(&self, max_attempts: u32) -> bool {
        let max_attempts = max_attempts.max(1);
        let policy = &self.inner.settings.retry;

        for attempt in 0..max_attempts {
            if self.is_shutting_down() {
                return false;
            }
            if self.connect().await {
                if attempt > 0 {
                    info!(attempt = attempt + 1, "connected after retry");
                }
                return true;
            }
            if attempt + 1 == max_attempts {
                break;
            }

            let delay = policy.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts,
                delay_ms = millis(delay),
                "connect attempt failed, backing off"
            );
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => return false,
                () = tokio::time::sleep(delay) => {}
            }
        }

        error!(
            endpoint = %self.inner.settings.endpoint(),
            max_attempts,
            "gateway unreachable, giving up"
        );
        false
    }

    /// Tear down the link and go to `Disconnected`. Safe to repeat.
    pub async fn disconnect(&self) {
        let _transition = self.inner.transition.lock().await;
        let had_link = self.teardown().await;
        self.set_state(ConnectionState::Disconnected);
        if had_link {
            info!(endpoint = %self.inner.settings.endpoint(), "disconnected from gateway");
        }
    }

    /// Cancel background work and in-flight calls, then disconnect.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.disconnect().await;
    }

    // ── Health ───────────────────────────────────────────────────

    /// Demote `Connected → Degraded` after a transport-class failure.
    ///
    /// Reports for any generation other than the current one are ignored.
    pub fn mark_degraded(&self, generation: u64) -> bool {
        let changed = self.inner.state.send_if_modified(|state| {
            let current = self
                .inner
                .link
                .load()
                .as_ref()
                .map(|active| active.generation);
            if *state == ConnectionState::Connected && current == Some(generation) {
                *state = ConnectionState::Degraded;
                true
            } else {
                false
            }
        });

        if changed {
            self.publish_status(ConnectionState::Degraded);
            warn!(generation, "gateway connection degraded");
        } else {
            debug!(generation, "failure report ignored");
        }
        changed
    }

    /// One liveness call on the current link. Degrades the connection on
    /// a transport-class failure.
    pub async fn check_liveness(&self) -> bool {
        let Some(active) = self.current_link() else {
            return false;
        };
        let timeout = self.inner.settings.probe_timeout;

        let result = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => return false,
            r = tokio::time::timeout(timeout, active.link.get_device_list(timeout)) => r,
        };

        match result {
            Ok(Ok(_)) => true,
            Ok(Err(status)) if !is_transport_code(status.code()) => {
                debug!(code = ?status.code(), "liveness call rejected, transport is up");
                true
            }
            Ok(Err(status)) => {
                warn!(code = ?status.code(), message = status.message(), "liveness check failed");
                self.mark_degraded(active.generation);
                false
            }
            Err(_) => {
                warn!(timeout_ms = millis(timeout), "liveness check timed out");
                self.mark_degraded(active.generation);
                false
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────

    /// Caller holds the transition lock.
    async fn connect_locked(&self, cert_override: Option<&CertificateOverride>) -> bool {
        let endpoint = self.inner.settings.endpoint();
        if self.is_shutting_down() {
            debug!("shutdown in progress, not connecting");
            return false;
        }

        let transport = match self.inner.settings.transport(cert_override) {
            Ok(transport) => transport,
            Err(e) => {
                error!(endpoint = %endpoint, error = %e, "invalid connection settings");
                return false;
            }
        };

        if self.is_connected() {
            // Replacing a healthy link is not a status flip unless it fails.
            self.set_state_quiet(ConnectionState::Connecting);
        } else {
            self.set_state(ConnectionState::Connecting);
        }
        // At most one live link: the old one goes before the new one is built.
        self.teardown().await;

        match self.establish(&transport).await {
            Ok(link) => {
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                self.inner
                    .link
                    .store(Some(Arc::new(ActiveLink { link, generation })));
                self.set_state(ConnectionState::Connected);
                info!(
                    endpoint = %endpoint,
                    generation,
                    secure = transport.tls.is_secure(),
                    "connected to gateway"
                );
                true
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "gateway connection failed");
                self.set_state(ConnectionState::Disconnected);
                false
            }
        }
    }

    /// Open a link and verify it with a liveness call.
    async fn establish(
        &self,
        transport: &doorlink_api::TransportConfig,
    ) -> Result<Arc<dyn GatewayLink>, CoreError> {
        let endpoint = transport.authority();
        let failed = |reason: String| CoreError::ConnectionFailed {
            endpoint: endpoint.clone(),
            reason,
        };

        let link = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => return Err(CoreError::Cancelled),
            r = self.inner.connector.connect(transport) => r.map_err(|e| failed(e.to_string()))?,
        };

        let timeout = self.inner.settings.probe_timeout;
        let probe = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => return Err(CoreError::Cancelled),
            r = tokio::time::timeout(timeout, link.get_device_list(timeout)) => r,
        };

        let verdict = match probe {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(status)) if !is_transport_code(status.code()) => {
                debug!(code = ?status.code(), "liveness probe rejected, transport is up");
                Ok(())
            }
            Ok(Err(status)) => Err(failed(format!("liveness probe: {}", status.message()))),
            Err(_) => Err(failed(format!(
                "liveness probe timed out after {}ms",
                millis(timeout)
            ))),
        };

        match verdict {
            Ok(()) => Ok(link),
            Err(e) => {
                self.shutdown_link(link.as_ref()).await;
                Err(e)
            }
        }
    }

    /// Remove and shut down the current link. Returns whether one existed.
    async fn teardown(&self) -> bool {
        match self.inner.link.swap(None) {
            Some(old) => {
                self.shutdown_link(old.link.as_ref()).await;
                debug!(generation = old.generation, "link torn down");
                true
            }
            None => false,
        }
    }

    async fn shutdown_link(&self, link: &dyn GatewayLink) {
        let limit = self.inner.settings.shutdown_timeout;
        if tokio::time::timeout(limit, link.shutdown()).await.is_err() {
            warn!(timeout_ms = millis(limit), "link shutdown timed out, dropping it");
        }
    }

    fn set_state(&self, next: ConnectionState) {
        self.set_state_quiet(next);
        self.publish_status(next);
    }

    /// Move the state channel without touching the status channel.
    fn set_state_quiet(&self, next: ConnectionState) {
        let previous = self.inner.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "connection state changed");
        }
    }

    fn publish_status(&self, state: ConnectionState) {
        let connected = state == ConnectionState::Connected;
        self.inner.status.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_displays_variant_name() {
        assert_eq!(ConnectionState::Degraded.to_string(), "Degraded");
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
