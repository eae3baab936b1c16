//! Async gRPC client for access-control device gateways.
//!
//! This crate is the wire layer of the doorlink workspace:
//!
//! - **[`transport`]**: the channel factory. Turns a [`TransportConfig`]
//!   (host, port, [`TlsMode`], certificate paths) into a live
//!   [`tonic::transport::Channel`], validating credential files up front.
//! - **[`proto`]**: protobuf messages for the `DeviceService` and
//!   `DoorService` gateway contracts.
//! - **[`GatewayClient`]**: typed unary calls over one channel, each with
//!   an explicit deadline.
//! - **[`Error`]**: configuration vs transport vs status failures.
//!
//! Connection supervision, retries and result caching live one layer up,
//! in `doorlink-core`.

pub mod client;
pub mod error;
pub mod proto;
pub mod tls;
pub mod transport;

pub use client::GatewayClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
