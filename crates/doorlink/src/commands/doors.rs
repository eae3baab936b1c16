//! Door command handlers.

use doorlink_core::{DeviceId, Door, DoorId, DoorStatus, Gateway};
use tabled::Tabled;

use crate::cli::{DoorsArgs, DoorsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DoorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl From<&Door> for DoorRow {
    fn from(d: &Door) -> Self {
        Self {
            id: d.id.to_string(),
            device: d.device_id.to_string(),
            name: d.name.clone(),
            enabled: if d.enabled { "yes" } else { "no" }.into(),
        }
    }
}

#[derive(Tabled)]
struct DoorStatusRow {
    #[tabled(rename = "Door")]
    door: String,
    #[tabled(rename = "Locked")]
    locked: String,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "Alarm")]
    alarm: String,
}

fn status_row(s: &DoorStatus, color: bool) -> DoorStatusRow {
    DoorStatusRow {
        door: s.door_id.to_string(),
        locked: output::paint_flag(s.locked, false, color),
        open: output::paint_flag(s.open, true, color),
        alarm: output::paint_flag(s.alarm, true, color),
    }
}

fn door_ids(doors: &[u32]) -> Vec<DoorId> {
    doors.iter().copied().map(DoorId::new).collect()
}

fn joined(doors: &[u32]) -> String {
    doors
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    gateway: &Gateway,
    args: DoorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DoorsCommand::List { device } => {
            let doors = gateway.list_doors(DeviceId::new(device)).await;
            let out = output::render_list(
                global.output_format(),
                &doors,
                |d| DoorRow::from(d),
                |d| d.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DoorsCommand::Status { device } => {
            let statuses = gateway.door_status(DeviceId::new(device)).await;
            let color = output::should_color(global.color_mode());
            let out = output::render_list(
                global.output_format(),
                &statuses,
                |s| status_row(s, color),
                |s| s.door_id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DoorsCommand::Lock { device, doors } => {
            let done = gateway
                .lock_doors(DeviceId::new(device), &door_ids(&doors))
                .await;
            util::require(done, &format!("lock doors {}", joined(&doors)))?;
            util::note(global, &format!("Locked door(s) {}", joined(&doors)));
            Ok(())
        }

        DoorsCommand::Unlock { device, doors } => {
            let done = gateway
                .unlock_doors(DeviceId::new(device), &door_ids(&doors))
                .await;
            util::require(done, &format!("unlock doors {}", joined(&doors)))?;
            util::note(global, &format!("Unlocked door(s) {}", joined(&doors)));
            Ok(())
        }

        DoorsCommand::Add { device, name } => {
            let id = gateway
                .add_door(DeviceId::new(device), &name)
                .await
                .ok_or_else(|| CliError::CommandFailed {
                    action: format!("add door '{name}'"),
                })?;
            util::note(global, &format!("Door '{name}' added as {id}"));
            output::print_output(&id.to_string(), global.quiet);
            Ok(())
        }

        DoorsCommand::Delete { device, door } => {
            if !util::confirm(
                &format!("Delete door {door} from device {device}?"),
                global.yes,
            )? {
                return Ok(());
            }
            util::require(
                gateway
                    .delete_door(DeviceId::new(device), DoorId::new(door))
                    .await,
                &format!("delete door {door}"),
            )?;
            util::note(global, &format!("Door {door} deleted"));
            Ok(())
        }
    }
}
