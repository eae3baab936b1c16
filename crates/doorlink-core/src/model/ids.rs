// ── Gateway-assigned identifiers ──
//
// Devices and doors are addressed by unsigned 32-bit numbers chosen by
// the gateway. The newtypes keep the two from being mixed up.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── DeviceId ────────────────────────────────────────────────────────

/// Identifier of a door controller on the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// ── DoorId ──────────────────────────────────────────────────────────

/// Identifier of a door behind a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorId(u32);

impl DoorId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Id for a door registered from this side, taken from the wall clock.
    ///
    /// The Unix timestamp in seconds is truncated to its low 32 bits, so two
    /// doors added within the same second collide and the value wraps in
    /// 2106.
    pub fn from_clock() -> Self {
        let secs = chrono::Utc::now().timestamp() & i64::from(u32::MAX);
        Self(u32::try_from(secs).unwrap_or_default())
    }
}

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DoorId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u32> for DoorId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&DeviceId::new(7)).unwrap(), "7");
        let door: DoorId = serde_json::from_str("42").unwrap();
        assert_eq!(door, DoorId::new(42));
    }

    #[test]
    fn ids_parse_from_cli_text() {
        assert_eq!(" 12 ".parse::<DeviceId>().unwrap().get(), 12);
        assert!("-1".parse::<DoorId>().is_err());
    }

    #[test]
    fn clock_id_is_nonzero() {
        assert_ne!(DoorId::from_clock().get(), 0);
    }
}
