// ── Gateway link ──
//
// The typed RPC surface the supervisor hands out, one async method per
// remote procedure. `GrpcLink` drives a real tonic channel; tests plug in
// in-memory implementations through `Connector`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use doorlink_api::proto::{
    AddRequest, AddResponse, ConnectRequest, ConnectResponse, DeleteRequest, DeleteResponse,
    DisconnectAllResponse, DisconnectRequest, DisconnectResponse, DoorControlRequest,
    DoorControlResponse, GetDeviceListResponse, GetListRequest, GetListResponse,
    GetStatusRequest, GetStatusResponse, SearchDeviceRequest, SearchDeviceResponse,
};
use doorlink_api::{GatewayClient, TransportConfig};
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tonic::Status;
use tracing::debug;

/// Typed calls against one established gateway channel.
///
/// Every call carries its deadline, which the implementation forwards to
/// the gateway. Failures come back as `tonic::Status`; classification is
/// the executor's job.
#[async_trait]
pub trait GatewayLink: Send + Sync {
    async fn get_device_list(&self, deadline: Duration) -> Result<GetDeviceListResponse, Status>;

    async fn connect(
        &self,
        request: ConnectRequest,
        deadline: Duration,
    ) -> Result<ConnectResponse, Status>;

    async fn disconnect(
        &self,
        request: DisconnectRequest,
        deadline: Duration,
    ) -> Result<DisconnectResponse, Status>;

    async fn disconnect_all(&self, deadline: Duration) -> Result<DisconnectAllResponse, Status>;

    async fn search_device(
        &self,
        request: SearchDeviceRequest,
        deadline: Duration,
    ) -> Result<SearchDeviceResponse, Status>;

    async fn door_list(
        &self,
        request: GetListRequest,
        deadline: Duration,
    ) -> Result<GetListResponse, Status>;

    async fn door_status(
        &self,
        request: GetStatusRequest,
        deadline: Duration,
    ) -> Result<GetStatusResponse, Status>;

    async fn door_add(
        &self,
        request: AddRequest,
        deadline: Duration,
    ) -> Result<AddResponse, Status>;

    async fn door_delete(
        &self,
        request: DeleteRequest,
        deadline: Duration,
    ) -> Result<DeleteResponse, Status>;

    async fn door_lock(
        &self,
        request: DoorControlRequest,
        deadline: Duration,
    ) -> Result<DoorControlResponse, Status>;

    async fn door_unlock(
        &self,
        request: DoorControlRequest,
        deadline: Duration,
    ) -> Result<DoorControlResponse, Status>;

    /// Stop accepting calls and wait for in-flight ones to finish.
    ///
    /// The supervisor bounds this with its shutdown timeout.
    async fn shutdown(&self) {}
}

/// Builds a [`GatewayLink`] for a transport configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        transport: &TransportConfig,
    ) -> Result<Arc<dyn GatewayLink>, doorlink_api::Error>;
}

// ── gRPC implementation ──────────────────────────────────────────────

/// [`GatewayLink`] over a tonic channel.
///
/// The channel closes once the last clone of the client is dropped;
/// `shutdown` refuses new calls and drains the ones already running.
pub struct GrpcLink {
    client: GatewayClient,
    in_flight: TaskTracker,
}

impl GrpcLink {
    pub fn new(client: GatewayClient) -> Self {
        Self {
            client,
            in_flight: TaskTracker::new(),
        }
    }

    fn admit(&self) -> Result<TaskTrackerToken, Status> {
        if self.in_flight.is_closed() {
            return Err(Status::unavailable("gateway link is shut down"));
        }
        Ok(self.in_flight.token())
    }
}

#[async_trait]
impl GatewayLink for GrpcLink {
    async fn get_device_list(&self, deadline: Duration) -> Result<GetDeviceListResponse, Status> {
        let _call = self.admit()?;
        self.client.get_device_list(deadline).await
    }

    async fn connect(
        &self,
        request: ConnectRequest,
        deadline: Duration,
    ) -> Result<ConnectResponse, Status> {
        let _call = self.admit()?;
        self.client.connect(request, deadline).await
    }

    async fn disconnect(
        &self,
        request: DisconnectRequest,
        deadline: Duration,
    ) -> Result<DisconnectResponse, Status> {
        let _call = self.admit()?;
        self.client.disconnect(request, deadline).await
    }

    async fn disconnect_all(&self, deadline: Duration) -> Result<DisconnectAllResponse, Status> {
        let _call = self.admit()?;
        self.client.disconnect_all(deadline).await
    }

    async fn search_device(
        &self,
        request: SearchDeviceRequest,
        deadline: Duration,
    ) -> Result<SearchDeviceResponse, Status> {
        let _call = self.admit()?;
        self.client.search_device(request, deadline).await
    }

    async fn door_list(
        &self,
        request: GetListRequest,
        deadline: Duration,
    ) -> Result<GetListResponse, Status> {
        let _call = self.admit()?;
        self.client.door_list(request, deadline).await
    }

    async fn door_status(
        &self,
        request: GetStatusRequest,
        deadline: Duration,
    ) -> Result<GetStatusResponse, Status> {
        let _call = self.admit()?;
        self.client.door_status(request, deadline).await
    }

    async fn door_add(
        &self,
        request: AddRequest,
        deadline: Duration,
    ) -> Result<AddResponse, Status> {
        let _call = self.admit()?;
        self.client.door_add(request, deadline).await
    }

    async fn door_delete(
        &self,
        request: DeleteRequest,
        deadline: Duration,
    ) -> Result<DeleteResponse, Status> {
        let _call = self.admit()?;
        self.client.door_delete(request, deadline).await
    }

    async fn door_lock(
        &self,
        request: DoorControlRequest,
        deadline: Duration,
    ) -> Result<DoorControlResponse, Status> {
        let _call = self.admit()?;
        self.client.door_lock(request, deadline).await
    }

    async fn door_unlock(
        &self,
        request: DoorControlRequest,
        deadline: Duration,
    ) -> Result<DoorControlResponse, Status> {
        let _call = self.admit()?;
        self.client.door_unlock(request, deadline).await
    }

    async fn shutdown(&self) {
        self.in_flight.close();
        debug!(in_flight = self.in_flight.len(), "draining gateway link");
        self.in_flight.wait().await;
    }
}

/// Opens real tonic channels through the channel factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcConnector;

#[async_trait]
impl Connector for GrpcConnector {
    async fn connect(
        &self,
        transport: &TransportConfig,
    ) -> Result<Arc<dyn GatewayLink>, doorlink_api::Error> {
        let channel = transport.connect().await?;
        Ok(Arc::new(GrpcLink::new(GatewayClient::new(channel))))
    }
}
