// Gateway gRPC client
//
// Typed unary calls for the DeviceService and DoorService contracts over a
// single tonic channel. Every call takes an explicit deadline, which is
// sent to the gateway as `grpc-timeout`. Local enforcement of the deadline
// (and everything else about failure handling) belongs to the caller.

use std::time::Duration;

use tonic::codec::ProstCodec;
use tonic::codegen::{Body, Bytes, StdError, http};
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::trace;

use crate::proto::{self, paths};

/// Raw client for the device gateway.
///
/// Cheap to clone: the underlying channel multiplexes calls over one
/// HTTP/2 connection, so each call clones the service handle instead of
/// borrowing it mutably.
#[derive(Debug, Clone)]
pub struct GatewayClient<T = Channel> {
    inner: tonic::client::Grpc<T>,
}

impl GatewayClient<Channel> {
    /// Wrap an established channel.
    pub fn new(channel: Channel) -> Self {
        Self::with_service(channel)
    }
}

impl<T> GatewayClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody> + Clone,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    /// Wrap any gRPC-capable service (used for in-process transports).
    pub fn with_service(service: T) -> Self {
        Self {
            inner: tonic::client::Grpc::new(service),
        }
    }

    async fn unary<Req, Resp>(
        &self,
        path: &'static str,
        message: Req,
        deadline: Duration,
    ) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready().await.map_err(|e| {
            let e: StdError = e.into();
            Status::unavailable(format!("gateway channel not ready: {e}"))
        })?;

        let mut request = Request::new(message);
        request.set_timeout(deadline);

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(request, http::uri::PathAndQuery::from_static(path), codec)
            .await?;
        trace!(path, "gateway call completed");
        Ok(response.into_inner())
    }

    // ── DeviceService ────────────────────────────────────────────────

    pub async fn get_device_list(
        &self,
        deadline: Duration,
    ) -> Result<proto::GetDeviceListResponse, Status> {
        self.unary(paths::GET_DEVICE_LIST, proto::GetDeviceListRequest {}, deadline)
            .await
    }

    pub async fn connect(
        &self,
        request: proto::ConnectRequest,
        deadline: Duration,
    ) -> Result<proto::ConnectResponse, Status> {
        self.unary(paths::CONNECT, request, deadline).await
    }

    pub async fn disconnect(
        &self,
        request: proto::DisconnectRequest,
        deadline: Duration,
    ) -> Result<proto::DisconnectResponse, Status> {
        self.unary(paths::DISCONNECT, request, deadline).await
    }

    pub async fn disconnect_all(
        &self,
        deadline: Duration,
    ) -> Result<proto::DisconnectAllResponse, Status> {
        self.unary(paths::DISCONNECT_ALL, proto::DisconnectAllRequest {}, deadline)
            .await
    }

    pub async fn search_device(
        &self,
        request: proto::SearchDeviceRequest,
        deadline: Duration,
    ) -> Result<proto::SearchDeviceResponse, Status> {
        self.unary(paths::SEARCH_DEVICE, request, deadline).await
    }

    // ── DoorService ──────────────────────────────────────────────────

    pub async fn door_list(
        &self,
        request: proto::GetListRequest,
        deadline: Duration,
    ) -> Result<proto::GetListResponse, Status> {
        self.unary(paths::DOOR_GET_LIST, request, deadline).await
    }

    pub async fn door_status(
        &self,
        request: proto::GetStatusRequest,
        deadline: Duration,
    ) -> Result<proto::GetStatusResponse, Status> {
        self.unary(paths::DOOR_GET_STATUS, request, deadline).await
    }

    pub async fn door_add(
        &self,
        request: proto::AddRequest,
        deadline: Duration,
    ) -> Result<proto::AddResponse, Status> {
        self.unary(paths::DOOR_ADD, request, deadline).await
    }

    pub async fn door_delete(
        &self,
        request: proto::DeleteRequest,
        deadline: Duration,
    ) -> Result<proto::DeleteResponse, Status> {
        self.unary(paths::DOOR_DELETE, request, deadline).await
    }

    pub async fn door_lock(
        &self,
        request: proto::DoorControlRequest,
        deadline: Duration,
    ) -> Result<proto::DoorControlResponse, Status> {
        self.unary(paths::DOOR_LOCK, request, deadline).await
    }

    pub async fn door_unlock(
        &self,
        request: proto::DoorControlRequest,
        deadline: Duration,
    ) -> Result<proto::DoorControlResponse, Status> {
        self.unary(paths::DOOR_UNLOCK, request, deadline).await
    }
}
