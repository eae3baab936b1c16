//! CLI configuration: thin wrapper around `doorlink_config`.
//!
//! Adds the `--config` path override and applies `GlobalOpts` flag
//! overrides (--address, --port, -k, --retries) on top of the file.

use std::path::PathBuf;

use clap::ValueEnum;
use doorlink_core::ConnectionSettings;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use doorlink_config::{Config, GatewaySection, save_config_to};

/// `--config` if given, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(doorlink_config::config_path)
}

/// Load the file at [`config_path`] layered with the environment.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    doorlink_config::load_config_from(&path).map_err(|source| match source {
        doorlink_config::ConfigError::Validation { .. } => source.into(),
        source => CliError::Config {
            path: path.display().to_string(),
            source,
        },
    })
}

/// Fill unset presentation flags from the `[defaults]` section.
///
/// Unknown values in the file fall back to the built-in defaults.
pub fn apply_defaults(global: &mut GlobalOpts, config: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&config.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&config.defaults.color, true).ok();
    }
}

/// Translate the file + flag overrides into supervisor settings.
pub fn resolve_settings(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ConnectionSettings, CliError> {
    let mut config = config.clone();
    if let Some(ref address) = global.address {
        config.gateway.address.clone_from(address);
    }
    if let Some(port) = global.port {
        config.gateway.port = port;
    }
    if global.insecure_skip_verify {
        config.gateway.ignore_cert_errors = true;
    }
    if let Some(retries) = global.retries {
        config.retry.attempts = retries;
    }
    Ok(config.to_settings()?)
}
