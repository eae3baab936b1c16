//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use doorlink_config::ConfigError;
use doorlink_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to gateway at {endpoint}")]
    #[diagnostic(
        code(doorlink::connection_failed),
        help(
            "Check that the gateway is running and reachable.\n\
             Gave up after {attempts} attempt(s); raise with --retries.\n\
             Run with -v for per-attempt details."
        )
    )]
    ConnectionFailed { endpoint: String, attempts: u32 },

    #[error("Gateway unavailable: {message}")]
    #[diagnostic(code(doorlink::unavailable))]
    Unavailable { message: String },

    #[error("Gateway call timed out: {detail}")]
    #[diagnostic(code(doorlink::timeout))]
    Timeout { detail: String },

    #[error("Interrupted")]
    #[diagnostic(code(doorlink::cancelled))]
    Cancelled,

    // ── Operations ───────────────────────────────────────────────────
    #[error("Gateway did not complete '{action}'")]
    #[diagnostic(
        code(doorlink::command_failed),
        help("The gateway refused the request or the call failed. Run with -v for details.")
    )]
    CommandFailed { action: String },

    #[error("Gateway rejected the request: {message}")]
    #[diagnostic(code(doorlink::rejected))]
    Rejected { message: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(doorlink::not_found),
        help("Run: doorlink {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(doorlink::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid connection settings: {message}")]
    #[diagnostic(
        code(doorlink::settings),
        help("Check the [gateway] section and that every certificate file exists.")
    )]
    Settings { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Could not load configuration")]
    #[diagnostic(
        code(doorlink::config),
        help("Config file: {path}\nFix or recreate it with: doorlink config init")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(doorlink::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::Settings { .. }
            | Self::Config { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Settings { message },
            CoreError::ConnectionFailed { endpoint, reason: _ } => CliError::ConnectionFailed {
                endpoint,
                attempts: 1,
            },
            CoreError::Unavailable { message } => CliError::Unavailable { message },
            CoreError::Timeout { detail } => CliError::Timeout { detail },
            CoreError::Cancelled => CliError::Cancelled,
            CoreError::Rejected { message } | CoreError::Internal(message) => {
                CliError::Rejected { message }
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                path: doorlink_config::config_path().display().to_string(),
                source: other,
            },
        }
    }
}
