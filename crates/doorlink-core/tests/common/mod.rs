// Shared in-memory gateway for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use doorlink_api::TransportConfig;
use doorlink_api::proto::{
    AddRequest, AddResponse, ConnectRequest, ConnectResponse, DeleteRequest, DeleteResponse,
    DeviceInfo, DisconnectAllResponse, DisconnectRequest, DisconnectResponse, DoorControlRequest,
    DoorControlResponse, DoorInfo, DoorStatusInfo, GetDeviceListResponse, GetListRequest,
    GetListResponse, GetStatusRequest, GetStatusResponse, SearchDeviceRequest,
    SearchDeviceResponse,
};
use doorlink_core::{
    ConnectionSettings, Connector, ExecutorConfig, Gateway, GatewayLink, Supervisor,
};
use tokio::sync::Notify;
use tonic::Status;

// ── StubLink ────────────────────────────────────────────────────────

/// Scriptable gateway. Every call is counted by procedure name.
#[derive(Default)]
pub struct StubLink {
    pub devices: Vec<DeviceInfo>,
    pub doors: Vec<DoorInfo>,
    /// `GetDeviceList` calls past this many fail with `Unavailable`.
    pub device_list_ok_calls: Option<usize>,
    /// Every `GetDeviceList` call fails with this status.
    pub device_list_error: Option<Status>,
    /// Status returned by `Lock`/`Unlock`.
    pub door_control_error: Option<Status>,
    /// `Lock` answers `success = false`.
    pub refuse_lock: bool,
    /// `Lock` waits for `release` before answering.
    pub block_lock: bool,
    pub release: Notify,
    pub in_flight: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub calls: Mutex<HashMap<&'static str, usize>>,
}

impl StubLink {
    pub fn healthy() -> Self {
        Self {
            devices: vec![device(1, "10.0.0.21"), device(2, "10.0.0.22")],
            doors: vec![door(1, 1, "Main entrance"), door(2, 1, "Loading dock")],
            ..Self::default()
        }
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn record(&self, name: &'static str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(name).or_insert(0);
        *count += 1;
        *count
    }

    fn door_control(&self, request: &DoorControlRequest) -> Result<DoorControlResponse, Status> {
        if let Some(status) = &self.door_control_error {
            return Err(status.clone());
        }
        Ok(DoorControlResponse {
            success: !self.refuse_lock,
            message: String::new(),
            failed_door_ids: if self.refuse_lock {
                request.door_ids.clone()
            } else {
                Vec::new()
            },
        })
    }
}

pub fn device(id: u32, ip: &str) -> DeviceInfo {
    DeviceInfo {
        device_id: id,
        ip: ip.into(),
        port: 4370,
        serial_number: format!("AC-{id:04}"),
        model: "inBio-460".into(),
        connected: true,
    }
}

pub fn door(id: u32, device_id: u32, name: &str) -> DoorInfo {
    DoorInfo {
        door_id: id,
        device_id,
        name: name.into(),
        enabled: true,
    }
}

#[async_trait]
impl GatewayLink for StubLink {
    async fn get_device_list(&self, _deadline: Duration) -> Result<GetDeviceListResponse, Status> {
        let n = self.record("get_device_list");
        if let Some(status) = &self.device_list_error {
            return Err(status.clone());
        }
        if self.device_list_ok_calls.is_some_and(|ok| n > ok) {
            return Err(Status::unavailable("gateway went away"));
        }
        Ok(GetDeviceListResponse {
            devices: self.devices.clone(),
        })
    }

    async fn connect(
        &self,
        request: ConnectRequest,
        _deadline: Duration,
    ) -> Result<ConnectResponse, Status> {
        self.record("connect");
        let known = self.devices.iter().find(|d| d.ip == request.ip);
        Ok(ConnectResponse {
            success: known.is_some(),
            device_id: known.map_or(0, |d| d.device_id),
            message: if known.is_some() {
                String::new()
            } else {
                "no controller at that address".into()
            },
        })
    }

    async fn disconnect(
        &self,
        request: DisconnectRequest,
        _deadline: Duration,
    ) -> Result<DisconnectResponse, Status> {
        self.record("disconnect");
        let known = self.devices.iter().any(|d| d.device_id == request.device_id);
        Ok(DisconnectResponse {
            success: known,
            message: String::new(),
        })
    }

    async fn disconnect_all(&self, _deadline: Duration) -> Result<DisconnectAllResponse, Status> {
        self.record("disconnect_all");
        Ok(DisconnectAllResponse {
            success: true,
            disconnected: u32::try_from(self.devices.len()).unwrap(),
        })
    }

    async fn search_device(
        &self,
        _request: SearchDeviceRequest,
        _deadline: Duration,
    ) -> Result<SearchDeviceResponse, Status> {
        self.record("search_device");
        Ok(SearchDeviceResponse {
            devices: vec![device(9, "10.0.0.99")],
        })
    }

    async fn door_list(
        &self,
        request: GetListRequest,
        _deadline: Duration,
    ) -> Result<GetListResponse, Status> {
        self.record("door_list");
        Ok(GetListResponse {
            doors: self
                .doors
                .iter()
                .filter(|d| d.device_id == request.device_id)
                .cloned()
                .collect(),
        })
    }

    async fn door_status(
        &self,
        request: GetStatusRequest,
        _deadline: Duration,
    ) -> Result<GetStatusResponse, Status> {
        self.record("door_status");
        Ok(GetStatusResponse {
            statuses: self
                .doors
                .iter()
                .filter(|d| d.device_id == request.device_id)
                .map(|d| DoorStatusInfo {
                    door_id: d.door_id,
                    locked: true,
                    open: false,
                    alarm: false,
                })
                .collect(),
        })
    }

    async fn door_add(
        &self,
        request: AddRequest,
        _deadline: Duration,
    ) -> Result<AddResponse, Status> {
        self.record("door_add");
        let Some(door) = request.door else {
            return Err(Status::invalid_argument("door is required"));
        };
        Ok(AddResponse {
            success: true,
            door_id: door.door_id,
            message: String::new(),
        })
    }

    async fn door_delete(
        &self,
        request: DeleteRequest,
        _deadline: Duration,
    ) -> Result<DeleteResponse, Status> {
        self.record("door_delete");
        if self.doors.iter().any(|d| d.door_id == request.door_id) {
            Ok(DeleteResponse {
                success: true,
                message: String::new(),
            })
        } else {
            Err(Status::not_found(format!("door {}", request.door_id)))
        }
    }

    async fn door_lock(
        &self,
        request: DoorControlRequest,
        _deadline: Duration,
    ) -> Result<DoorControlResponse, Status> {
        self.record("door_lock");
        if self.block_lock {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        self.door_control(&request)
    }

    async fn door_unlock(
        &self,
        request: DoorControlRequest,
        _deadline: Duration,
    ) -> Result<DoorControlResponse, Status> {
        self.record("door_unlock");
        self.door_control(&request)
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ── StubConnector ───────────────────────────────────────────────────

/// Hands out the same [`StubLink`] once the gateway "accepts" connections.
pub struct StubConnector {
    pub link: Arc<StubLink>,
    /// 1-based attempt from which connections are accepted.
    pub accept_from: usize,
    pub attempts: AtomicUsize,
}

impl StubConnector {
    pub fn accepting(link: StubLink) -> Self {
        Self::accepting_from(link, 1)
    }

    pub fn accepting_from(link: StubLink, attempt: usize) -> Self {
        Self {
            link: Arc::new(link),
            accept_from: attempt,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn refusing() -> Self {
        Self::accepting_from(StubLink::healthy(), usize::MAX)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(
        &self,
        _transport: &TransportConfig,
    ) -> Result<Arc<dyn GatewayLink>, doorlink_api::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < self.accept_from {
            return Err(doorlink_api::Error::Status(Status::unavailable(
                "connection refused",
            )));
        }
        Ok(Arc::clone(&self.link) as Arc<dyn GatewayLink>)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn stub_settings() -> ConnectionSettings {
    ConnectionSettings {
        address: "stub-gateway".into(),
        port: 9999,
        executor: ExecutorConfig {
            // One bucket for the whole run so cache tests never straddle a boundary.
            cache_bucket: Duration::from_secs(u64::MAX),
            ..ExecutorConfig::default()
        },
        ..ConnectionSettings::default()
    }
}

pub fn supervisor(connector: &Arc<StubConnector>) -> Supervisor {
    Supervisor::new(stub_settings(), Arc::clone(connector) as Arc<dyn Connector>).unwrap()
}

pub fn gateway(connector: &Arc<StubConnector>) -> Gateway {
    Gateway::from_supervisor(supervisor(connector))
}
