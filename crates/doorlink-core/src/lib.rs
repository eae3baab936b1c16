// doorlink-core: supervised gateway connection and the operations built on it.
//
// Layering, bottom up:
//
//   link        typed RPC surface over one channel (GatewayLink / Connector)
//   supervisor  owns the link, state machine, reconnect with backoff
//   executor    permit pool, deadlines, result cache, failure classification
//   watchdog    periodic health check and reconnection
//   gateway     device/door facades returning plain defaults on failure

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod link;
pub mod model;
pub mod supervisor;
pub mod watchdog;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    CertificateOverride, ConnectionSettings, ExecutorConfig, RetryPolicy, TransportMode,
    WatchdogConfig,
};
pub use error::CoreError;
pub use executor::{Call, Executor, Operation, Outcome};
pub use gateway::Gateway;
pub use link::{Connector, GatewayLink, GrpcConnector, GrpcLink};
pub use supervisor::{ActiveLink, ConnectionState, Supervisor};
pub use watchdog::{Watchdog, WatchdogHandle, next_interval};

pub use model::{Device, DeviceId, Door, DoorId, DoorStatus};
