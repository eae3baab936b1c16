// ── Operation executor ──
//
// Every remote call goes through here:
//
//   1. cache lookup (cacheable reads only, no permit taken)
//   2. permit from a fixed pool, waiting at most `acquire_wait`
//   3. connected check against the supervisor
//   4. the call itself under a local deadline, also sent to the gateway
//   5. classification of the result into an `Outcome`
//
// Transport-class failures degrade the supervisor's connection for the
// link generation that was used. Nothing is ever propagated: callers get
// an `Outcome` from `run` or a default value from `execute`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tonic::{Code, Status};
use tracing::{debug, error, info, warn};

use crate::cache::ResultCache;
use crate::config::ExecutorConfig;
use crate::error::CoreError;
use crate::link::GatewayLink;
use crate::supervisor::{Supervisor, millis};

// ── Operation ────────────────────────────────────────────────────

/// Every remote procedure the facades issue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    ListDevices,
    ConnectDevice,
    DisconnectDevice,
    DisconnectAllDevices,
    SearchDevices,
    ListDoors,
    DoorStatus,
    AddDoor,
    DeleteDoor,
    LockDoors,
    UnlockDoors,
}

impl Operation {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Deadline used when the caller does not pick one.
    pub const fn default_timeout(self) -> Duration {
        match self {
            Self::DoorStatus => Duration::from_secs(5),
            Self::ListDevices
            | Self::DisconnectDevice
            | Self::ListDoors
            | Self::AddDoor
            | Self::DeleteDoor
            | Self::LockDoors
            | Self::UnlockDoors => Duration::from_secs(10),
            Self::ConnectDevice | Self::DisconnectAllDevices => Duration::from_secs(15),
            Self::SearchDevices => Duration::from_secs(30),
        }
    }

    /// Only list reads are cached; live status and mutations never are.
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::ListDevices | Self::ListDoors)
    }
}

// ── Call ─────────────────────────────────────────────────────────

/// How one call should be run.
#[derive(Debug, Clone)]
pub struct Call {
    pub operation: Operation,
    pub timeout: Duration,
    pub cache_key: Option<String>,
}

impl Call {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            timeout: operation.default_timeout(),
            cache_key: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cache the result under `key`. Ignored for non-cacheable operations.
    pub fn cached(mut self, key: impl Into<String>) -> Self {
        if self.operation.is_cacheable() {
            self.cache_key = Some(key.into());
        }
        self
    }
}

// ── Outcome ──────────────────────────────────────────────────────

/// What happened to one call.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// No permit became free within the acquire wait.
    Overloaded,
    /// The supervisor reported no usable connection.
    Disconnected,
    /// The gateway or the channel was unavailable.
    Unavailable,
    /// The deadline passed. Carries the deadline the call ran under.
    Timeout(Duration),
    /// The call was cancelled in transit.
    Cancelled,
    /// The gateway answered with a non-transport error.
    Rejected(Status),
    /// The process is shutting down.
    ShuttingDown,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.into_option().unwrap_or(default)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Overloaded => Outcome::Overloaded,
            Self::Disconnected => Outcome::Disconnected,
            Self::Unavailable => Outcome::Unavailable,
            Self::Timeout(deadline) => Outcome::Timeout(deadline),
            Self::Cancelled => Outcome::Cancelled,
            Self::Rejected(status) => Outcome::Rejected(status),
            Self::ShuttingDown => Outcome::ShuttingDown,
        }
    }

    /// Convert a failure into the matching [`CoreError`].
    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Overloaded => Err(CoreError::Unavailable {
                message: "too many concurrent requests".into(),
            }),
            Self::Disconnected => Err(CoreError::Unavailable {
                message: "not connected to the gateway".into(),
            }),
            Self::Unavailable => Err(CoreError::Unavailable {
                message: "gateway unavailable".into(),
            }),
            Self::Timeout(deadline) => Err(CoreError::Timeout {
                detail: format!("no answer within {}ms", millis(deadline)),
            }),
            Self::Cancelled | Self::ShuttingDown => Err(CoreError::Cancelled),
            Self::Rejected(status) => Err(status.into()),
        }
    }
}

// ── Executor ─────────────────────────────────────────────────────

/// Bounded, deadline-enforcing, failure-absorbing call runner.
///
/// Cheaply cloneable via `Arc<ExecutorInner>`.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    supervisor: Supervisor,
    permits: Semaphore,
    capacity: usize,
    acquire_wait: Duration,
    cache: ResultCache,
}

impl Executor {
    pub fn new(supervisor: Supervisor, config: &ExecutorConfig) -> Self {
        let capacity = config.max_concurrency.max(1);
        Self {
            inner: Arc::new(ExecutorInner {
                supervisor,
                permits: Semaphore::new(capacity),
                capacity,
                acquire_wait: config.acquire_wait,
                cache: ResultCache::new(config.cache_bucket, config.cache_capacity),
            }),
        }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.inner.supervisor
    }

    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn available_permits(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Run `call` and return its default on any failure.
    pub async fn execute<T, F, Fut>(&self, spec: Call, default: T, call: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Arc<dyn GatewayLink>, Duration) -> Fut + Send,
        Fut: Future<Output = Result<T, Status>> + Send,
    {
        self.run(spec, call).await.unwrap_or(default)
    }

    /// Run `call` and report exactly what happened.
    ///
    /// `call` receives the current link and the deadline to forward.
    pub async fn run<T, F, Fut>(&self, spec: Call, call: F) -> Outcome<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Arc<dyn GatewayLink>, Duration) -> Fut + Send,
        Fut: Future<Output = Result<T, Status>> + Send,
    {
        let operation = spec.operation;
        let supervisor = &self.inner.supervisor;

        if let Some(key) = spec.cache_key.as_deref() {
            if let Some(hit) = self.inner.cache.get::<T>(operation, key) {
                return Outcome::Success(hit);
            }
        }

        if supervisor.is_shutting_down() {
            debug!(operation = %operation, "executor shutting down, call skipped");
            return Outcome::ShuttingDown;
        }

        let _permit = match tokio::time::timeout(
            self.inner.acquire_wait,
            self.inner.permits.acquire(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Outcome::ShuttingDown,
            Err(_) => {
                warn!(
                    operation = %operation,
                    capacity = self.inner.capacity,
                    "too many concurrent requests, call shed"
                );
                return Outcome::Overloaded;
            }
        };

        let active = match supervisor.current_link() {
            Some(active) if supervisor.is_connected() => active,
            _ => {
                debug!(
                    operation = %operation,
                    state = %supervisor.state(),
                    "not connected, call skipped"
                );
                return Outcome::Disconnected;
            }
        };

        let cancel = supervisor.child_token();
        let pending = call(Arc::clone(&active.link), spec.timeout);
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(operation = %operation, "call abandoned for shutdown");
                return Outcome::ShuttingDown;
            }
            r = tokio::time::timeout(spec.timeout, pending) => r,
        };

        match result {
            Ok(Ok(value)) => {
                if let Some(key) = spec.cache_key.as_deref() {
                    self.inner.cache.insert(operation, key, value.clone());
                }
                Outcome::Success(value)
            }
            Ok(Err(status)) => self.classify(operation, active.generation, spec.timeout, status),
            Err(_) => {
                info!(
                    operation = %operation,
                    timeout_ms = millis(spec.timeout),
                    "gateway call timed out"
                );
                supervisor.mark_degraded(active.generation);
                Outcome::Timeout(spec.timeout)
            }
        }
    }

    fn classify<T>(
        &self,
        operation: Operation,
        generation: u64,
        deadline: Duration,
        status: Status,
    ) -> Outcome<T> {
        let supervisor = &self.inner.supervisor;
        match status.code() {
            Code::Unavailable => {
                warn!(operation = %operation, message = status.message(), "gateway unavailable");
                supervisor.mark_degraded(generation);
                Outcome::Unavailable
            }
            Code::DeadlineExceeded => {
                info!(operation = %operation, "gateway reported deadline exceeded");
                supervisor.mark_degraded(generation);
                Outcome::Timeout(deadline)
            }
            Code::Cancelled if supervisor.is_shutting_down() => {
                debug!(operation = %operation, "call cancelled during shutdown");
                Outcome::ShuttingDown
            }
            Code::Cancelled => {
                info!(operation = %operation, "gateway call cancelled");
                supervisor.mark_degraded(generation);
                Outcome::Cancelled
            }
            code => {
                error!(
                    operation = %operation,
                    code = ?code,
                    message = status.message(),
                    "gateway call failed"
                );
                Outcome::Rejected(status)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn only_lists_are_cacheable() {
        let cacheable: Vec<_> = Operation::iter().filter(|op| op.is_cacheable()).collect();
        assert_eq!(cacheable, vec![Operation::ListDevices, Operation::ListDoors]);
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Operation::DisconnectAllDevices.name(), "disconnect_all_devices");
        assert_eq!(Operation::LockDoors.to_string(), "lock_doors");
    }

    #[test]
    fn cached_key_ignored_for_mutations() {
        assert!(Call::new(Operation::LockDoors).cached("1").cache_key.is_none());
        assert_eq!(
            Call::new(Operation::ListDoors).cached("1").cache_key.as_deref(),
            Some("1")
        );
    }

    #[test]
    fn every_operation_has_a_deadline() {
        for op in Operation::iter() {
            assert!(op.default_timeout() >= Duration::from_secs(5), "{op}");
        }
    }

    #[test]
    fn outcome_collapses_to_default() {
        let shed: Outcome<Vec<u32>> = Outcome::Overloaded;
        assert!(shed.unwrap_or(Vec::new()).is_empty());
        assert_eq!(Outcome::Success(3).map(|n| n * 2).into_option(), Some(6));
        assert!(Outcome::<u32>::Disconnected.into_result().unwrap_err().is_unavailable());
    }

    #[test]
    fn timeout_error_names_the_deadline() {
        let err = Outcome::<u32>::Timeout(Duration::from_secs(2)).into_result().unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
        assert_eq!(err.to_string(), "Gateway call timed out: no answer within 2000ms");
    }
}
