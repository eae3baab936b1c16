//! Clap derive structures for the `doorlink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.
//! Depends only on clap so the build script can render man pages from it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// doorlink -- operate door controllers through a gRPC gateway
#[derive(Debug, Parser)]
#[command(
    name = "doorlink",
    version,
    about = "Operate door controllers through a gRPC gateway",
    long_about = "Connects to a door controller gateway, keeps the connection healthy,\n\
        and exposes device and door operations from the command line.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "DOORLINK_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Gateway address (overrides config)
    #[arg(long, short = 'a', env = "DOORLINK_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Gateway port (overrides config)
    #[arg(long, short = 'P', env = "DOORLINK_PORT", global = true)]
    pub port: Option<u16>,

    /// Accept any server certificate (development only)
    #[arg(long, short = 'k', global = true)]
    pub insecure_skip_verify: bool,

    /// Connection attempts before giving up (overrides config)
    #[arg(long, short = 'r', global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "DOORLINK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

impl GlobalOpts {
    pub fn output_format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }

    pub fn color_mode(&self) -> &ColorMode {
        self.color.as_ref().unwrap_or(&ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage door controllers known to the gateway
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage and operate doors
    Doors(DoorsArgs),

    /// Connect to the gateway and report the connection state
    Status,

    /// Keep the connection supervised and print state changes until Ctrl-C
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List controllers known to the gateway
    #[command(alias = "ls")]
    List,

    /// Open a gateway session to a controller
    Connect {
        /// Controller IP address
        ip: String,

        /// Controller port
        #[arg(default_value = "4370")]
        port: u16,
    },

    /// Close the gateway session to a controller
    Disconnect {
        /// Device ID
        device: u32,
    },

    /// Close every controller session
    DisconnectAll,

    /// Broadcast discovery of controllers on the gateway's network
    Search,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DOORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DoorsArgs {
    #[command(subcommand)]
    pub command: DoorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoorsCommand {
    /// List doors configured on a controller
    #[command(alias = "ls")]
    List {
        /// Device ID
        device: u32,
    },

    /// Show live lock/open/alarm state
    Status {
        /// Device ID
        device: u32,
    },

    /// Lock one or more doors
    Lock {
        /// Device ID
        device: u32,

        /// Door IDs
        #[arg(required = true, num_args = 1..)]
        doors: Vec<u32>,
    },

    /// Unlock one or more doors
    Unlock {
        /// Device ID
        device: u32,

        /// Door IDs
        #[arg(required = true, num_args = 1..)]
        doors: Vec<u32>,
    },

    /// Register a new door on a controller
    Add {
        /// Device ID
        device: u32,

        /// Door name
        name: String,
    },

    /// Remove a door from a controller
    Delete {
        /// Device ID
        device: u32,

        /// Door ID
        door: u32,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Health check interval in seconds (overrides config)
    #[arg(long, short = 'i', value_name = "SECS")]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved configuration
    Show,

    /// Create the config file with guided setup
    Init,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
