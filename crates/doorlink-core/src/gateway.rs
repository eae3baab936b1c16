// ── Device and door operations ──
//
// Typed wrappers over the executor, one per gateway procedure. They shape
// requests, map responses into domain types and collapse every failure
// to a default: empty lists, `false`, or `None`. A response whose
// `success` flag is false counts as a failure.

use doorlink_api::proto::{
    AddRequest, ConnectRequest, DeleteRequest, DisconnectRequest, DoorControlRequest, DoorInfo,
    GetListRequest, GetStatusRequest, SearchDeviceRequest,
};
use tokio::sync::watch;
use tracing::warn;

use crate::executor::{Call, Executor, Operation};
use crate::model::{Device, DeviceId, Door, DoorId, DoorStatus};
use crate::supervisor::{ConnectionState, Supervisor};

/// How long the gateway listens for broadcast replies during a search.
const SEARCH_LISTEN_MS: u32 = 5_000;

/// Facade over one supervised gateway connection.
///
/// Cheaply cloneable; both halves are injected.
#[derive(Clone)]
pub struct Gateway {
    supervisor: Supervisor,
    executor: Executor,
}

impl Gateway {
    pub fn new(supervisor: Supervisor, executor: Executor) -> Self {
        Self {
            supervisor,
            executor,
        }
    }

    /// Build the executor from the supervisor's own settings.
    pub fn from_supervisor(supervisor: Supervisor) -> Self {
        let executor = Executor::new(supervisor.clone(), &supervisor.settings().executor);
        Self::new(supervisor, executor)
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn is_connected(&self) -> bool {
        self.supervisor.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<bool> {
        self.supervisor.subscribe_status()
    }

    // ── Devices ──────────────────────────────────────────────────

    /// Controllers known to the gateway.
    pub async fn list_devices(&self) -> Vec<Device> {
        self.executor
            .execute(
                Call::new(Operation::ListDevices).cached("all"),
                Vec::new(),
                |link, deadline| async move {
                    link.get_device_list(deadline).await.map(|response| {
                        response.devices.into_iter().map(Device::from).collect::<Vec<_>>()
                    })
                },
            )
            .await
    }

    /// Ask the gateway to open a session to the controller at `ip:port`.
    pub async fn connect_device(&self, ip: &str, port: u16) -> Option<DeviceId> {
        let request = ConnectRequest {
            ip: ip.to_owned(),
            port: u32::from(port),
            password: String::new(),
        };
        let response = self
            .executor
            .run(Call::new(Operation::ConnectDevice), |link, deadline| async move {
                link.connect(request, deadline).await
            })
            .await
            .into_option()?;

        if response.success {
            Some(DeviceId::new(response.device_id))
        } else {
            warn!(ip, port, message = %response.message, "gateway refused device connection");
            None
        }
    }

    pub async fn disconnect_device(&self, device: DeviceId) -> bool {
        let request = DisconnectRequest {
            device_id: device.get(),
        };
        let Some(response) = self
            .executor
            .run(
                Call::new(Operation::DisconnectDevice),
                |link, deadline| async move { link.disconnect(request, deadline).await },
            )
            .await
            .into_option()
        else {
            return false;
        };

        if !response.success {
            warn!(
                device = %device,
                message = %response.message,
                "gateway refused device disconnect"
            );
        }
        response.success
    }

    pub async fn disconnect_all_devices(&self) -> bool {
        let Some(response) = self
            .executor
            .run(
                Call::new(Operation::DisconnectAllDevices),
                |link, deadline| async move { link.disconnect_all(deadline).await },
            )
            .await
            .into_option()
        else {
            return false;
        };

        if !response.success {
            warn!(disconnected = response.disconnected, "gateway refused disconnect-all");
        }
        response.success
    }

    /// Broadcast discovery of controllers on the gateway's network. Never cached.
    pub async fn search_devices(&self) -> Vec<Device> {
        let request = SearchDeviceRequest {
            timeout_ms: SEARCH_LISTEN_MS,
        };
        self.executor
            .execute(
                Call::new(Operation::SearchDevices),
                Vec::new(),
                |link, deadline| async move {
                    link.search_device(request, deadline).await.map(|response| {
                        response.devices.into_iter().map(Device::from).collect::<Vec<_>>()
                    })
                },
            )
            .await
    }

    // ── Doors ────────────────────────────────────────────────────

    /// Doors configured on one controller, cached per device.
    pub async fn list_doors(&self, device: DeviceId) -> Vec<Door> {
        let request = GetListRequest {
            device_id: device.get(),
        };
        self.executor
            .execute(
                Call::new(Operation::ListDoors).cached(device.to_string()),
                Vec::new(),
                |link, deadline| async move {
                    link.door_list(request, deadline).await.map(|response| {
                        response.doors.into_iter().map(Door::from).collect::<Vec<_>>()
                    })
                },
            )
            .await
    }

    /// Live door states. Never cached.
    pub async fn door_status(&self, device: DeviceId) -> Vec<DoorStatus> {
        let request = GetStatusRequest {
            device_id: device.get(),
        };
        self.executor
            .execute(
                Call::new(Operation::DoorStatus),
                Vec::new(),
                |link, deadline| async move {
                    link.door_status(request, deadline).await.map(|response| {
                        response
                            .statuses
                            .into_iter()
                            .map(DoorStatus::from)
                            .collect::<Vec<_>>()
                    })
                },
            )
            .await
    }

    pub async fn lock_doors(&self, device: DeviceId, doors: &[DoorId]) -> bool {
        self.door_control(Operation::LockDoors, device, doors).await
    }

    pub async fn unlock_doors(&self, device: DeviceId, doors: &[DoorId]) -> bool {
        self.door_control(Operation::UnlockDoors, device, doors).await
    }

    /// Register a door. The id is generated from the clock
    /// (see [`DoorId::from_clock`]); the gateway may assign its own.
    pub async fn add_door(&self, device: DeviceId, name: &str) -> Option<DoorId> {
        let proposed = DoorId::from_clock();
        let request = AddRequest {
            device_id: device.get(),
            door: Some(DoorInfo {
                door_id: proposed.get(),
                device_id: device.get(),
                name: name.to_owned(),
                enabled: true,
            }),
        };
        let response = self
            .executor
            .run(Call::new(Operation::AddDoor), |link, deadline| async move {
                link.door_add(request, deadline).await
            })
            .await
            .into_option()?;

        if !response.success {
            warn!(device = %device, name, message = %response.message, "gateway refused new door");
            return None;
        }
        match response.door_id {
            0 => Some(proposed),
            assigned => Some(DoorId::new(assigned)),
        }
    }

    pub async fn delete_door(&self, device: DeviceId, door: DoorId) -> bool {
        let request = DeleteRequest {
            device_id: device.get(),
            door_id: door.get(),
        };
        let Some(response) = self
            .executor
            .run(
                Call::new(Operation::DeleteDoor),
                |link, deadline| async move { link.door_delete(request, deadline).await },
            )
            .await
            .into_option()
        else {
            return false;
        };

        if !response.success {
            warn!(
                device = %device,
                door = %door,
                message = %response.message,
                "gateway refused door deletion"
            );
        }
        response.success
    }

    async fn door_control(&self, operation: Operation, device: DeviceId, doors: &[DoorId]) -> bool {
        let request = DoorControlRequest {
            device_id: device.get(),
            door_ids: doors.iter().map(|door| door.get()).collect(),
        };
        let Some(response) = self
            .executor
            .run(Call::new(operation), |link, deadline| async move {
                if operation == Operation::LockDoors {
                    link.door_lock(request, deadline).await
                } else {
                    link.door_unlock(request, deadline).await
                }
            })
            .await
            .into_option()
        else {
            return false;
        };

        if !response.failed_door_ids.is_empty() {
            warn!(
                operation = %operation,
                device = %device,
                failed = ?response.failed_door_ids,
                "some doors did not switch"
            );
        }
        if !response.success {
            warn!(
                operation = %operation,
                device = %device,
                message = %response.message,
                "gateway refused door command"
            );
        }
        response.success
    }
}
