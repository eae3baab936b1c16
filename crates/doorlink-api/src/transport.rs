// Channel factory for the gateway connection.
//
// Every connection, whatever its security mode, is built here: plaintext
// HTTP/2, server-verified TLS, mutual TLS, or TLS with verification turned
// off. Credential files are checked before any socket is opened so that a
// bad path surfaces as a configuration error, never as a network error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity, Uri};
use tracing::{debug, warn};

use crate::error::Error;
use crate::tls::{self, ClientIdentity};

/// How the channel is secured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Plaintext HTTP/2.
    Insecure,
    /// TLS, verifying the gateway against the system trust store or `ca_cert`.
    ServerTls { ca_cert: Option<PathBuf> },
    /// TLS with a client certificate. All three files are required.
    MutualTls {
        ca_cert: PathBuf,
        client_cert: PathBuf,
        client_key: PathBuf,
    },
}

impl TlsMode {
    pub fn is_secure(&self) -> bool {
        !matches!(self, Self::Insecure)
    }
}

/// Everything needed to open one channel to the gateway.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    /// Name to verify the certificate against. Defaults to `host`.
    pub domain: Option<String>,
    /// Skip certificate validation in TLS modes.
    pub ignore_cert_errors: bool,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 50051,
            tls: TlsMode::Insecure,
            domain: None,
            ignore_cert_errors: false,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// `host:port`, for logs and error messages.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn server_name(&self) -> &str {
        self.domain.as_deref().unwrap_or(&self.host)
    }

    /// Check settings and credential files without touching the network.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::Config {
                field: "address".into(),
                reason: "gateway address is empty".into(),
            });
        }
        if self.port == 0 {
            return Err(Error::Config {
                field: "port".into(),
                reason: "port must be between 1 and 65535".into(),
            });
        }

        match &self.tls {
            TlsMode::Insecure => Ok(()),
            TlsMode::ServerTls { ca_cert } => match ca_cert {
                Some(path) => require_readable("ca_cert", path),
                None => Ok(()),
            },
            TlsMode::MutualTls {
                ca_cert,
                client_cert,
                client_key,
            } => {
                require_readable("ca_cert", ca_cert)?;
                require_readable("client_cert", client_cert)?;
                require_readable("client_key", client_key)
            }
        }
    }

    /// Build the tonic endpoint (without connecting).
    fn endpoint(&self, scheme: &str) -> Result<Endpoint, Error> {
        let uri: Uri = format!("{scheme}://{}", self.authority())
            .parse()
            .map_err(|e| Error::InvalidEndpoint(format!("{}: {e}", self.authority())))?;
        Ok(Endpoint::from(uri)
            .connect_timeout(self.connect_timeout)
            .tcp_nodelay(true))
    }

    /// Open a channel to the gateway.
    ///
    /// Configuration problems are returned before any I/O happens.
    pub async fn connect(&self) -> Result<Channel, Error> {
        self.validate()?;

        match &self.tls {
            TlsMode::Insecure => {
                debug!(endpoint = %self.authority(), "opening plaintext channel");
                Ok(self.endpoint("http")?.connect().await?)
            }
            mode if self.ignore_cert_errors => self.connect_unverified(mode).await,
            TlsMode::ServerTls { ca_cert } => {
                let mut tls = ClientTlsConfig::new().domain_name(self.server_name());
                tls = match ca_cert {
                    Some(path) => tls.ca_certificate(Certificate::from_pem(read_file(path)?)),
                    None => tls.with_native_roots(),
                };
                debug!(endpoint = %self.authority(), "opening TLS channel");
                Ok(self.endpoint("https")?.tls_config(tls)?.connect().await?)
            }
            TlsMode::MutualTls {
                ca_cert,
                client_cert,
                client_key,
            } => {
                let identity = Identity::from_pem(read_file(client_cert)?, read_file(client_key)?);
                let tls = ClientTlsConfig::new()
                    .domain_name(self.server_name())
                    .ca_certificate(Certificate::from_pem(read_file(ca_cert)?))
                    .identity(identity);
                debug!(endpoint = %self.authority(), "opening mutual TLS channel");
                Ok(self.endpoint("https")?.tls_config(tls)?.connect().await?)
            }
        }
    }

    /// TLS without certificate validation, through a custom connector.
    async fn connect_unverified(&self, mode: &TlsMode) -> Result<Channel, Error> {
        warn!(
            endpoint = %self.authority(),
            "certificate validation is DISABLED for the gateway channel; this is unsafe outside a lab"
        );

        let identity = match mode {
            TlsMode::MutualTls {
                client_cert,
                client_key,
                ..
            } => Some(ClientIdentity::from_pem_files(client_cert, client_key)?),
            _ => None,
        };
        let config = Arc::new(tls::unverified_client_config(identity)?);
        let host = self.host.clone();
        let port = self.port;
        let server_name = self.server_name().to_owned();

        // The URI scheme stays `http`: TLS is handled by the connector.
        let connector = tower::service_fn(move |_: Uri| {
            tls::connect_tls(Arc::clone(&config), host.clone(), port, server_name.clone())
        });
        Ok(self
            .endpoint("http")?
            .connect_with_connector(connector)
            .await?)
    }
}

fn require_readable(field: &str, path: &Path) -> Result<(), Error> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(Error::Config {
            field: field.into(),
            reason: format!("{} is not a file", path.display()),
        }),
        Err(e) => Err(Error::Config {
            field: field.into(),
            reason: format!("{}: {e}", path.display()),
        }),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
