//! Configuration for the doorlink tools.
//!
//! A TOML file merged over built-in defaults and under `DOORLINK_*`
//! environment variables, translated to `doorlink_core::ConnectionSettings`.
//! The CLI layers its own flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doorlink_core::{
    ConnectionSettings, ExecutorConfig, RetryPolicy, TransportMode, WatchdogConfig,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub watchdog: WatchdogSection,

    #[serde(default)]
    pub executor: ExecutorSection,
}

/// Presentation defaults for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    pub output: String,
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: "table".into(),
            color: "auto".into(),
        }
    }
}

/// Where the gateway lives and how to secure the channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySection {
    pub address: String,
    pub port: u16,
    pub mode: TransportMode,

    /// PEM CA bundle; required for `mutual-tls`, optional for `tls`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<PathBuf>,

    /// Name to verify the server certificate against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Accept any server certificate. Development only.
    pub ignore_cert_errors: bool,

    pub connect_timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        let settings = ConnectionSettings::default();
        Self {
            address: settings.address,
            port: settings.port,
            mode: settings.mode,
            ca_cert: None,
            client_cert: None,
            client_key: None,
            domain: None,
            ignore_cert_errors: false,
            connect_timeout_secs: settings.connect_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySection {
    pub attempts: u32,
    pub delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            attempts: policy.attempts,
            delay_secs: policy.delay.as_secs(),
            max_delay_secs: policy.max_delay.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchdogSection {
    pub interval_secs: u64,
    pub grace_secs: u64,
    pub failure_threshold: u32,
    pub max_interval_secs: u64,
    /// Deadline for each liveness call.
    pub probe_timeout_secs: u64,
}

impl Default for WatchdogSection {
    fn default() -> Self {
        let watchdog = WatchdogConfig::default();
        Self {
            interval_secs: watchdog.interval.as_secs(),
            grace_secs: watchdog.grace.as_secs(),
            failure_threshold: watchdog.failure_threshold,
            max_interval_secs: watchdog.max_interval.as_secs(),
            probe_timeout_secs: ConnectionSettings::default().probe_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorSection {
    pub max_concurrency: usize,
    pub acquire_wait_ms: u64,
    pub cache_bucket_secs: u64,
    pub cache_capacity: usize,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        let executor = ExecutorConfig::default();
        Self {
            max_concurrency: executor.max_concurrency,
            acquire_wait_ms: u64::try_from(executor.acquire_wait.as_millis()).unwrap_or(100),
            cache_bucket_secs: executor.cache_bucket.as_secs(),
            cache_capacity: executor.cache_capacity,
        }
    }
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the supervisor's settings.
    ///
    /// Only shape is checked here; credential files are checked when the
    /// supervisor is created.
    pub fn to_settings(&self) -> Result<ConnectionSettings, ConfigError> {
        let gateway = &self.gateway;

        if gateway.address.trim().is_empty() {
            return Err(invalid("gateway.address", "must not be empty"));
        }
        if gateway.port == 0 {
            return Err(invalid("gateway.port", "must be between 1 and 65535"));
        }
        if gateway.mode == TransportMode::MutualTls {
            for (field, value) in [
                ("gateway.ca_cert", &gateway.ca_cert),
                ("gateway.client_cert", &gateway.client_cert),
                ("gateway.client_key", &gateway.client_key),
            ] {
                if value.is_none() {
                    return Err(invalid(field, "required in mutual-tls mode"));
                }
            }
        }
        if gateway.connect_timeout_secs == 0 {
            return Err(invalid("gateway.connect_timeout_secs", "must be positive"));
        }
        if self.retry.attempts == 0 {
            return Err(invalid("retry.attempts", "must be at least 1"));
        }
        if self.retry.delay_secs == 0 {
            return Err(invalid("retry.delay_secs", "must be at least 1"));
        }
        if self.retry.max_delay_secs < self.retry.delay_secs {
            return Err(invalid("retry.max_delay_secs", "must not be below retry.delay_secs"));
        }
        if self.watchdog.interval_secs == 0 {
            return Err(invalid("watchdog.interval_secs", "must be positive"));
        }
        if self.watchdog.max_interval_secs < self.watchdog.interval_secs {
            return Err(invalid(
                "watchdog.max_interval_secs",
                "must not be below watchdog.interval_secs",
            ));
        }
        if self.watchdog.probe_timeout_secs == 0 {
            return Err(invalid("watchdog.probe_timeout_secs", "must be positive"));
        }
        if self.executor.max_concurrency == 0 {
            return Err(invalid("executor.max_concurrency", "must be at least 1"));
        }

        Ok(ConnectionSettings {
            address: gateway.address.trim().to_owned(),
            port: gateway.port,
            mode: gateway.mode,
            ca_cert: gateway.ca_cert.clone(),
            client_cert: gateway.client_cert.clone(),
            client_key: gateway.client_key.clone(),
            domain: gateway.domain.clone(),
            ignore_cert_errors: gateway.ignore_cert_errors,
            connect_timeout: Duration::from_secs(gateway.connect_timeout_secs),
            probe_timeout: Duration::from_secs(self.watchdog.probe_timeout_secs),
            retry: RetryPolicy {
                attempts: self.retry.attempts,
                delay: Duration::from_secs(self.retry.delay_secs),
                max_delay: Duration::from_secs(self.retry.max_delay_secs),
            },
            watchdog: WatchdogConfig {
                interval: Duration::from_secs(self.watchdog.interval_secs),
                grace: Duration::from_secs(self.watchdog.grace_secs),
                failure_threshold: self.watchdog.failure_threshold,
                max_interval: Duration::from_secs(self.watchdog.max_interval_secs),
            },
            executor: ExecutorConfig {
                max_concurrency: self.executor.max_concurrency,
                acquire_wait: Duration::from_millis(self.executor.acquire_wait_ms),
                cache_bucket: Duration::from_secs(self.executor.cache_bucket_secs),
                cache_capacity: self.executor.cache_capacity,
            },
            ..ConnectionSettings::default()
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "doorlink", "doorlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("doorlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file leaves the defaults in place.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DOORLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
