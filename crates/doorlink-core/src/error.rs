// ── Core error types ──
//
// Errors surfaced by doorlink-core. Callers never see raw tonic errors:
// `From<doorlink_api::Error>` and `From<tonic::Status>` translate wire
// failures into the handful of classes the rest of the system acts on.
// Only `Config` is fatal; everything else is absorbed by the supervisor
// or collapsed to a default by the executor.

use thiserror::Error;
use tonic::Code;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to gateway at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Gateway call timed out: {detail}")]
    Timeout { detail: String },

    #[error("Operation cancelled")]
    Cancelled,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by gateway: {message}")]
    Rejected { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for errors that must abort startup.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns `true` for errors a user should see as "service unavailable".
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Unavailable { .. }
                | Self::Timeout { .. }
                | Self::Cancelled
        )
    }
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<doorlink_api::Error> for CoreError {
    fn from(err: doorlink_api::Error) -> Self {
        match err {
            doorlink_api::Error::Config { .. }
            | doorlink_api::Error::InvalidEndpoint(_)
            | doorlink_api::Error::Io { .. } => CoreError::Config {
                message: err.to_string(),
            },
            doorlink_api::Error::Transport(e) => CoreError::Unavailable {
                message: e.to_string(),
            },
            doorlink_api::Error::Tls(message) => CoreError::Unavailable {
                message: format!("TLS: {message}"),
            },
            doorlink_api::Error::Status(status) => status.into(),
        }
    }
}

impl From<tonic::Status> for CoreError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            Code::Unavailable => CoreError::Unavailable {
                message: status.message().to_owned(),
            },
            Code::DeadlineExceeded => CoreError::Timeout {
                detail: format!("gateway reported deadline exceeded ({})", status.message()),
            },
            Code::Cancelled => CoreError::Cancelled,
            Code::Internal | Code::Unknown | Code::DataLoss => {
                CoreError::Internal(status.message().to_owned())
            }
            code => CoreError::Rejected {
                message: format!("{code}: {}", status.message()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_config_error_stays_config() {
        let err: CoreError = doorlink_api::Error::Config {
            field: "client_key".into(),
            reason: "missing".into(),
        }
        .into();
        assert!(err.is_config());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn status_codes_map_to_classes() {
        assert!(CoreError::from(tonic::Status::unavailable("down")).is_unavailable());
        assert!(matches!(
            CoreError::from(tonic::Status::deadline_exceeded("slow")),
            CoreError::Timeout { .. }
        ));
        assert!(matches!(
            CoreError::from(tonic::Status::not_found("door 9")),
            CoreError::Rejected { .. }
        ));
    }
}
