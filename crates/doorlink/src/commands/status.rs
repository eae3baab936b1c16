//! `doorlink status`: connect once and report what the supervisor sees.

use std::time::Instant;

use doorlink_core::Gateway;
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct StatusReport {
    endpoint: String,
    mode: String,
    state: String,
    connected: bool,
    generation: Option<u64>,
    devices: usize,
    connect_ms: u64,
}

fn detail(report: &StatusReport, color: bool, state: doorlink_core::ConnectionState) -> String {
    [
        format!("Endpoint:   {}", report.endpoint),
        format!("Mode:       {}", report.mode),
        format!("State:      {}", output::paint_state(state, color)),
        format!(
            "Generation: {}",
            report.generation.map_or_else(|| "-".into(), |g| g.to_string())
        ),
        format!("Devices:    {}", report.devices),
        format!(
            "Connect:    {}",
            humantime::format_duration(std::time::Duration::from_millis(report.connect_ms))
        ),
    ]
    .join("\n")
}

pub async fn handle(gateway: &Gateway, global: &GlobalOpts) -> Result<(), CliError> {
    let started = Instant::now();
    util::connect(gateway, global).await?;
    let connect_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let devices = gateway.list_devices().await.len();
    let supervisor = gateway.supervisor();
    let settings = supervisor.settings();
    let state = supervisor.state();

    let report = StatusReport {
        endpoint: settings.endpoint(),
        mode: if settings.ignore_cert_errors {
            format!("{} (unverified)", settings.mode)
        } else {
            settings.mode.to_string()
        },
        state: state.to_string(),
        connected: supervisor.is_connected(),
        generation: supervisor.current_link().map(|active| active.generation),
        devices,
        connect_ms,
    };

    let color = output::should_color(global.color_mode());
    let out = output::render_single(
        global.output_format(),
        &report,
        |r| detail(r, color, state),
        |r| r.state.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
