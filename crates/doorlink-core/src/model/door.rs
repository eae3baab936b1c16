// ── Door domain types ──

use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, DoorId};

/// A door configured on a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub id: DoorId,
    pub device_id: DeviceId,
    pub name: String,
    pub enabled: bool,
}

/// Live state of one door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStatus {
    pub door_id: DoorId,
    pub locked: bool,
    pub open: bool,
    /// Forced-open or held-open alarm raised by the controller.
    pub alarm: bool,
}
