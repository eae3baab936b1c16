//! `doorlink watch`: supervise the connection in the foreground.
//!
//! Runs the watchdog against the configured gateway and prints one line
//! per connection state change until Ctrl-C.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use doorlink_core::{ConnectionState, Gateway, Watchdog};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StateEvent {
    at: String,
    state: String,
    connected: bool,
}

fn print_event(state: ConnectionState, global: &GlobalOpts, color: bool) {
    let event = StateEvent {
        at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        state: state.to_string(),
        connected: state == ConnectionState::Connected,
    };
    // Streamed output: one record per line (or per document for YAML).
    let line = match global.output_format() {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(&event, true),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(&event).trim_end()),
        OutputFormat::Plain => event.state,
        OutputFormat::Table => format!("{}  {}", event.at, output::paint_state(state, color)),
    };
    output::print_output(&line, global.quiet);
}

pub async fn handle(
    gateway: &Gateway,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let supervisor = gateway.supervisor().clone();
    let mut config = supervisor.settings().watchdog.clone();
    if let Some(secs) = args.interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be positive".into(),
            });
        }
        config.interval = Duration::from_secs(secs);
    }

    let color = output::should_color(global.color_mode());
    let mut states = supervisor.connection_state();
    let mut last = *states.borrow_and_update();
    print_event(last, global, color);

    // The first attempt is ours; the watchdog takes over after its grace delay.
    if !supervisor.connect().await {
        tracing::warn!(endpoint = %supervisor.settings().endpoint(), "initial connect failed");
    }
    let watchdog = Watchdog::spawn(supervisor.clone(), config);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        let state = *states.borrow_and_update();
        // Connecting is transient; only settled states are reported.
        if state != last && state != ConnectionState::Connecting {
            print_event(state, global, color);
            last = state;
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted, stopping watchdog");
                break;
            }
        }
    }

    watchdog.stop().await;
    Ok(())
}
