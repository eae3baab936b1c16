// ── Domain model ──
//
// Canonical representations of what the gateway reports. Wire messages
// are converted into these in `crate::convert`; consumers (the CLI) only
// ever see these types.

pub mod device;
pub mod door;
pub mod ids;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::Device;
pub use door::{Door, DoorStatus};
pub use ids::{DeviceId, DoorId};
