use std::path::PathBuf;

use thiserror::Error;
use tonic::Code;

/// Top-level error type for the `doorlink-api` crate.
///
/// Separates the two failure families that callers treat differently:
/// configuration problems (bad certificate paths, malformed endpoints),
/// which are fatal and never retried, and transport/status problems,
/// which the supervisor absorbs and retries.
/// `doorlink-core` maps these into its own diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// A required setting is missing or a credential file is unusable.
    #[error("Invalid configuration for {field}: {reason}")]
    Config { field: String, reason: String },

    /// The gateway address could not be turned into a valid URI.
    #[error("Invalid gateway endpoint: {0}")]
    InvalidEndpoint(String),

    /// Reading a credential file failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Channel establishment failed (refused, unreachable, DNS, handshake).
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// TLS configuration or handshake error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Call ────────────────────────────────────────────────────────
    /// A call completed with a non-OK gRPC status.
    #[error("gRPC status {}: {}", .0.code(), .0.message())]
    Status(#[from] tonic::Status),
}

impl Error {
    /// Returns `true` for configuration errors, which must not be retried.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::InvalidEndpoint(_) | Self::Io { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Tls(_) => true,
            Self::Status(status) => is_transport_code(status.code()),
            _ => false,
        }
    }
}

/// Status codes that describe the channel rather than the call:
/// the gateway is unreachable, the deadline ran out, or the call was dropped.
pub fn is_transport_code(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_not_transient() {
        let err = Error::Config {
            field: "client_key".into(),
            reason: "file not found".into(),
        };
        assert!(err.is_config());
        assert!(!err.is_transient());
    }

    #[test]
    fn unavailable_status_is_transient() {
        let err = Error::from(tonic::Status::unavailable("gateway down"));
        assert!(err.is_transient());
        assert!(!err.is_config());
    }

    #[test]
    fn permission_denied_is_not_transient() {
        let err = Error::from(tonic::Status::permission_denied("nope"));
        assert!(!err.is_transient());
    }
}
