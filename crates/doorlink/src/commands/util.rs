//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use doorlink_core::Gateway;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Connect with the configured retry budget, showing a spinner on a TTY.
pub async fn connect(gateway: &Gateway, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = gateway.supervisor().settings();
    let attempts = settings.retry.attempts;
    let endpoint = settings.endpoint();

    let spinner = (!global.quiet && std::io::stderr().is_terminal()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Connecting to {endpoint}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let connected = gateway.supervisor().connect_with_retry(attempts).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    if connected {
        Ok(())
    } else {
        Err(CliError::ConnectionFailed { endpoint, attempts })
    }
}

/// Turn a facade's `false` into an error naming the action.
pub fn require(done: bool, action: &str) -> Result<(), CliError> {
    if done {
        Ok(())
    } else {
        Err(CliError::CommandFailed {
            action: action.into(),
        })
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Print a status line to stderr unless `--quiet`.
pub fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
