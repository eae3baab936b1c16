// ── Runtime connection settings ──
//
// These types describe *how* to reach the gateway and how hard to try.
// They never touch disk: doorlink-config (or a test) builds a
// `ConnectionSettings` and hands it to the supervisor, which keeps it
// for its whole lifetime.

use std::path::PathBuf;
use std::time::Duration;

use doorlink_api::{TlsMode, TransportConfig};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How the gateway channel is secured.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TransportMode {
    /// Plaintext HTTP/2.
    #[default]
    Insecure,
    /// TLS without a client certificate.
    Tls,
    /// TLS with a client certificate.
    MutualTls,
}

/// One-shot certificate handling for [`Supervisor::connect_secure`].
///
/// [`Supervisor::connect_secure`]: crate::Supervisor::connect_secure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateOverride {
    /// Skip server certificate validation.
    AcceptInvalid,
    /// Validate against this CA instead of the configured one.
    CustomCa(PathBuf),
}

/// Reconnect backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after 0-based `attempt`: doubles each time, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Background health checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub interval: Duration,
    /// Wait before the first tick.
    pub grace: Duration,
    /// Consecutive failures tolerated before the interval starts growing.
    pub failure_threshold: u32,
    pub max_interval: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            grace: Duration::from_secs(5),
            failure_threshold: 5,
            max_interval: Duration::from_secs(30 * 60),
        }
    }
}

/// Admission control and result caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub max_concurrency: usize,
    /// How long a caller may wait for a permit before being shed.
    pub acquire_wait: Duration,
    /// Width of a cache time bucket.
    pub cache_bucket: Duration,
    /// Entry count that triggers a bulk clear.
    pub cache_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            acquire_wait: Duration::from_millis(100),
            cache_bucket: Duration::from_secs(60),
            cache_capacity: 100,
        }
    }
}

/// Everything the supervisor needs to reach one gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub address: String,
    pub port: u16,
    pub mode: TransportMode,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    /// Certificate name override; defaults to `address`.
    pub domain: Option<String>,
    pub ignore_cert_errors: bool,
    pub connect_timeout: Duration,
    /// Deadline for the liveness call made after connecting and by the watchdog.
    pub probe_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub retry: RetryPolicy,
    pub watchdog: WatchdogConfig,
    pub executor: ExecutorConfig,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: 50051,
            mode: TransportMode::Insecure,
            ca_cert: None,
            client_cert: None,
            client_key: None,
            domain: None,
            ignore_cert_errors: false,
            connect_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            watchdog: WatchdogConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl ConnectionSettings {
    /// `address:port`.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Translate into a channel factory config, applying an optional
    /// one-shot certificate override.
    ///
    /// An override on an insecure profile upgrades it to server TLS.
    pub fn transport(
        &self,
        cert_override: Option<&CertificateOverride>,
    ) -> Result<TransportConfig, CoreError> {
        let mut ca_cert = self.ca_cert.clone();
        let mut ignore_cert_errors = self.ignore_cert_errors;
        match cert_override {
            Some(CertificateOverride::AcceptInvalid) => ignore_cert_errors = true,
            Some(CertificateOverride::CustomCa(path)) => {
                ca_cert = Some(path.clone());
                ignore_cert_errors = false;
            }
            None => {}
        }

        let tls = match (self.mode, cert_override) {
            (TransportMode::Insecure, None) => TlsMode::Insecure,
            (TransportMode::Insecure | TransportMode::Tls, _) => TlsMode::ServerTls { ca_cert },
            (TransportMode::MutualTls, _) => {
                let (Some(ca_cert), Some(client_cert), Some(client_key)) =
                    (ca_cert, self.client_cert.clone(), self.client_key.clone())
                else {
                    return Err(CoreError::Config {
                        message: "mutual-tls mode requires ca_cert, client_cert and client_key"
                            .into(),
                    });
                };
                TlsMode::MutualTls {
                    ca_cert,
                    client_cert,
                    client_key,
                }
            }
        };

        Ok(TransportConfig {
            host: self.address.clone(),
            port: self.port,
            tls,
            domain: self.domain.clone(),
            ignore_cert_errors,
            connect_timeout: self.connect_timeout,
        })
    }
}
