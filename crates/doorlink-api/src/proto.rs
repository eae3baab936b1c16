// Gateway protobuf contract.
//
// Two services share one channel: `gateway.device.DeviceService` manages
// controller sessions on the gateway, `gateway.door.DoorService` operates
// the doors behind a connected controller. Field tags mirror the
// gateway's .proto definitions and must not be renumbered.

/// RPC paths, one per remote procedure.
pub mod paths {
    pub const GET_DEVICE_LIST: &str = "/gateway.device.DeviceService/GetDeviceList";
    pub const CONNECT: &str = "/gateway.device.DeviceService/Connect";
    pub const DISCONNECT: &str = "/gateway.device.DeviceService/Disconnect";
    pub const DISCONNECT_ALL: &str = "/gateway.device.DeviceService/DisconnectAll";
    pub const SEARCH_DEVICE: &str = "/gateway.device.DeviceService/SearchDevice";

    pub const DOOR_GET_LIST: &str = "/gateway.door.DoorService/GetList";
    pub const DOOR_GET_STATUS: &str = "/gateway.door.DoorService/GetStatus";
    pub const DOOR_ADD: &str = "/gateway.door.DoorService/Add";
    pub const DOOR_DELETE: &str = "/gateway.door.DoorService/Delete";
    pub const DOOR_LOCK: &str = "/gateway.door.DoorService/Lock";
    pub const DOOR_UNLOCK: &str = "/gateway.door.DoorService/Unlock";
}

// ── DeviceService ────────────────────────────────────────────────────

/// A door controller known to the gateway.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceInfo {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
    #[prost(string, tag = "2")]
    pub ip: String,
    #[prost(uint32, tag = "3")]
    pub port: u32,
    #[prost(string, tag = "4")]
    pub serial_number: String,
    #[prost(string, tag = "5")]
    pub model: String,
    #[prost(bool, tag = "6")]
    pub connected: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetDeviceListRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetDeviceListResponse {
    #[prost(message, repeated, tag = "1")]
    pub devices: Vec<DeviceInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectRequest {
    #[prost(string, tag = "1")]
    pub ip: String,
    #[prost(uint32, tag = "2")]
    pub port: u32,
    /// Controller communication password; empty when none is set.
    #[prost(string, tag = "3")]
    pub password: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(uint32, tag = "2")]
    pub device_id: u32,
    #[prost(string, tag = "3")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisconnectRequest {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisconnectResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisconnectAllRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisconnectAllResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(uint32, tag = "2")]
    pub disconnected: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchDeviceRequest {
    /// How long the gateway listens for broadcast replies.
    #[prost(uint32, tag = "1")]
    pub timeout_ms: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchDeviceResponse {
    #[prost(message, repeated, tag = "1")]
    pub devices: Vec<DeviceInfo>,
}

// ── DoorService ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DoorInfo {
    #[prost(uint32, tag = "1")]
    pub door_id: u32,
    #[prost(uint32, tag = "2")]
    pub device_id: u32,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(bool, tag = "4")]
    pub enabled: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DoorStatusInfo {
    #[prost(uint32, tag = "1")]
    pub door_id: u32,
    #[prost(bool, tag = "2")]
    pub locked: bool,
    #[prost(bool, tag = "3")]
    pub open: bool,
    #[prost(bool, tag = "4")]
    pub alarm: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetListRequest {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetListResponse {
    #[prost(message, repeated, tag = "1")]
    pub doors: Vec<DoorInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStatusRequest {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStatusResponse {
    #[prost(message, repeated, tag = "1")]
    pub statuses: Vec<DoorStatusInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddRequest {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
    #[prost(message, optional, tag = "2")]
    pub door: Option<DoorInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(uint32, tag = "2")]
    pub door_id: u32,
    #[prost(string, tag = "3")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRequest {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
    #[prost(uint32, tag = "2")]
    pub door_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: String,
}

/// Shared by `Lock` and `Unlock`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DoorControlRequest {
    #[prost(uint32, tag = "1")]
    pub device_id: u32,
    #[prost(uint32, repeated, tag = "2")]
    pub door_ids: Vec<u32>,
}

/// Shared by `Lock` and `Unlock`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DoorControlResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: String,
    /// Doors the controller refused to switch.
    #[prost(uint32, repeated, tag = "3")]
    pub failed_door_ids: Vec<u32>,
}
