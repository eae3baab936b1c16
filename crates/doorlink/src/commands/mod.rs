//! Command dispatch: bridges CLI args -> gateway facades -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod doors;
pub mod status;
pub mod util;
pub mod watch;

use doorlink_core::Gateway;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
///
/// `status` and `watch` manage the connection themselves; everything else
/// needs it up first.
pub async fn dispatch(
    cmd: Command,
    gateway: &Gateway,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(gateway, global).await,
        Command::Watch(args) => watch::handle(gateway, args, global).await,
        Command::Devices(args) => {
            util::connect(gateway, global).await?;
            devices::handle(gateway, args, global).await
        }
        Command::Doors(args) => {
            util::connect(gateway, global).await?;
            doors::handle(gateway, args, global).await
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
