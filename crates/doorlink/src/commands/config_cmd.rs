//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use doorlink_core::TransportMode;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, GatewaySection};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# could not render config: {e}"))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_path(prompt: &str) -> Result<PathBuf, CliError> {
    let path: String = Input::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_err)?;
    let path = PathBuf::from(path);
    if !path.is_file() {
        eprintln!("   ! {} does not exist yet", path.display());
    }
    Ok(path)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path(global).display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out =
                output::render_single(global.output_format(), &cfg, format_config, |c| {
                    format!("{}:{}", c.gateway.address, c.gateway.port)
                });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(global),
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);
    eprintln!("doorlink configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    if path.exists()
        && !global.yes
        && !Confirm::new()
            .with_prompt("Overwrite the existing config?")
            .default(false)
            .interact()
            .map_err(prompt_err)?
    {
        return Ok(());
    }

    let defaults = GatewaySection::default();

    let address: String = Input::new()
        .with_prompt("Gateway address")
        .default(defaults.address.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let port: u16 = Input::new()
        .with_prompt("Gateway port")
        .default(defaults.port)
        .interact_text()
        .map_err(prompt_err)?;

    let modes = [
        TransportMode::Insecure,
        TransportMode::Tls,
        TransportMode::MutualTls,
    ];
    let labels = [
        "Plaintext (insecure)",
        "TLS",
        "Mutual TLS (client certificate)",
    ];
    let selection = Select::new()
        .with_prompt("Transport security")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let mode = modes.get(selection).copied().unwrap_or_default();

    let mut gateway = GatewaySection {
        address,
        port,
        mode,
        ..defaults
    };
    match mode {
        TransportMode::Insecure => {}
        TransportMode::Tls => {
            let custom_ca = Confirm::new()
                .with_prompt("Use a custom CA certificate?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            if custom_ca {
                gateway.ca_cert = Some(prompt_path("CA certificate (PEM)")?);
            }
        }
        TransportMode::MutualTls => {
            gateway.ca_cert = Some(prompt_path("CA certificate (PEM)")?);
            gateway.client_cert = Some(prompt_path("Client certificate (PEM)")?);
            gateway.client_key = Some(prompt_path("Client private key (PEM)")?);
        }
    }

    let cfg = Config {
        gateway,
        ..Config::default()
    };
    // Shape check before anything touches disk.
    cfg.to_settings()?;
    config::save_config_to(&cfg, &path)?;

    eprintln!("\nConfiguration written to {}", path.display());
    eprintln!("  Test it: doorlink status");
    Ok(())
}
