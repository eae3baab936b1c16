//! Device command handlers.

use doorlink_core::{Device, DeviceId, Gateway};
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Session")]
    session: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.to_string(),
            address: d.address(),
            serial: d.serial_number.clone(),
            model: d.model.clone(),
            session: if d.connected { "open" } else { "-" }.into(),
        }
    }
}

fn print_devices(devices: &[Device], global: &GlobalOpts) {
    let out = output::render_list(
        global.output_format(),
        devices,
        |d| DeviceRow::from(d),
        |d| d.id.to_string(),
    );
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    gateway: &Gateway,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = gateway.list_devices().await;
            print_devices(&devices, global);
            Ok(())
        }

        DevicesCommand::Connect { ip, port } => {
            let id = gateway
                .connect_device(&ip, port)
                .await
                .ok_or_else(|| CliError::CommandFailed {
                    action: format!("connect {ip}:{port}"),
                })?;
            util::note(global, &format!("Connected {ip}:{port} as device {id}"));
            output::print_output(&id.to_string(), global.quiet);
            Ok(())
        }

        DevicesCommand::Disconnect { device } => {
            let id = DeviceId::new(device);
            util::require(
                gateway.disconnect_device(id).await,
                &format!("disconnect device {id}"),
            )?;
            util::note(global, &format!("Device {id} disconnected"));
            Ok(())
        }

        DevicesCommand::DisconnectAll => {
            if !util::confirm("Disconnect every controller session?", global.yes)? {
                return Ok(());
            }
            util::require(gateway.disconnect_all_devices().await, "disconnect all devices")?;
            util::note(global, "All devices disconnected");
            Ok(())
        }

        DevicesCommand::Search => {
            util::note(global, "Searching for controllers...");
            let found = gateway.search_devices().await;
            print_devices(&found, global);
            Ok(())
        }
    }
}
