// ── Device domain types ──

use serde::{Deserialize, Serialize};

use super::ids::DeviceId;

/// A door controller as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub ip: String,
    pub port: u16,
    pub serial_number: String,
    pub model: String,
    /// Whether the gateway currently holds a session to the controller.
    pub connected: bool,
}

impl Device {
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
