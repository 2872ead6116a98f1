pub mod arpscan;
pub mod lookup;

use clap::{Args, Parser, Subcommand};
use dug_common::config::{DEFAULT_DELAY_SECS, DEFAULT_TIMEOUT_SECS};

#[derive(Parser)]
#[command(name = "dug")]
#[command(about = "Dug: a better dig. Resolves names and sweeps local subnets with ARP.")]
pub struct CommandLine {
    /// Log debug detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log records as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ARP scan an interface's subnet
    #[command(alias = "as")]
    Arpscan(ArpscanArgs),
    /// Resolve a host name
    #[command(alias = "l")]
    Lookup(LookupArgs),
}

#[derive(Args, Debug)]
pub struct ArpscanArgs {
    /// Interface to scan
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub iface: Option<String>,

    /// Scan all interfaces
    #[arg(short, long)]
    pub all: bool,

    /// Seconds to keep listening after the last request
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: f64,

    /// Seconds to wait between requests
    #[arg(short, long, default_value_t = DEFAULT_DELAY_SECS)]
    pub delay: f64,

    /// Only watch for replies, never transmit
    #[arg(long)]
    pub listen_only: bool,

    /// Also probe the network address of each subnet
    #[arg(long)]
    pub mask_walk: bool,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    pub host: String,

    /// Seconds to wait for the resolver
    #[arg(short, long, default_value_t = 0.1)]
    pub timeout: f64,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
