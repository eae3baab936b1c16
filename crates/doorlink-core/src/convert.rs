// ── Wire-to-domain type conversions ──
//
// Bridges `doorlink_api::proto` messages into `doorlink_core::model`
// types. Identifiers become newtypes; out-of-range ports collapse to 0.

use doorlink_api::proto::{DeviceInfo, DoorInfo, DoorStatusInfo};

use crate::model::{Device, DeviceId, Door, DoorId, DoorStatus};

impl From<DeviceInfo> for Device {
    fn from(info: DeviceInfo) -> Self {
        Self {
            id: DeviceId::new(info.device_id),
            ip: info.ip,
            port: u16::try_from(info.port).unwrap_or_default(),
            serial_number: info.serial_number,
            model: info.model,
            connected: info.connected,
        }
    }
}

impl From<DoorInfo> for Door {
    fn from(info: DoorInfo) -> Self {
        Self {
            id: DoorId::new(info.door_id),
            device_id: DeviceId::new(info.device_id),
            name: info.name,
            enabled: info.enabled,
        }
    }
}

impl From<DoorStatusInfo> for DoorStatus {
    fn from(info: DoorStatusInfo) -> Self {
        Self {
            door_id: DoorId::new(info.door_id),
            locked: info.locked,
            open: info.open,
            alarm: info.alarm,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn device_info_converts() {
        let device = Device::from(DeviceInfo {
            device_id: 3,
            ip: "10.0.0.31".into(),
            port: 4370,
            serial_number: "AC-0003".into(),
            model: "inBio-260".into(),
            connected: false,
        });
        assert_eq!(
            device,
            Device {
                id: DeviceId::new(3),
                ip: "10.0.0.31".into(),
                port: 4370,
                serial_number: "AC-0003".into(),
                model: "inBio-260".into(),
                connected: false,
            }
        );
        assert_eq!(device.address(), "10.0.0.31:4370");
    }

    #[test]
    fn out_of_range_port_becomes_zero() {
        let device = Device::from(DeviceInfo {
            port: 70_000,
            ..DeviceInfo::default()
        });
        assert_eq!(device.port, 0);
    }

    #[test]
    fn door_info_keeps_owner() {
        let door = Door::from(DoorInfo {
            door_id: 2,
            device_id: 3,
            name: "Lobby".into(),
            enabled: true,
        });
        assert_eq!(door.device_id, DeviceId::new(3));
        assert_eq!(door.id.get(), 2);
    }
}
