//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// velocitysp - control a VelocityDRIVE-SP switch over its serial console
#[derive(Parser, Debug)]
#[command(
    name = "velocitysp",
    author,
    version,
    about = "Host-side control stack for Microchip VelocityDRIVE-SP switches",
    long_about = r#"
Talks MUP1-framed CoAP/CBOR to a VelocityDRIVE-SP switch (LAN9662/68/92)
over a serial console or a TCP serial bridge.

QUICK START:
  velocitysp list-ports
  velocitysp -p /dev/ttyACM0 connect
  velocitysp -p /dev/ttyACM0 get /ietf-interfaces:interfaces
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Serial port device (falls back to the config file)
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports visible to the host
    ListPorts,

    /// Open the port and verify the device answers
    Connect,

    /// Show device model, port count and firmware identity
    Info,

    /// Ping the device over MUP1
    Ping(PingArgs),

    /// Read a YANG path
    Get(GetArgs),

    /// Write a value to a YANG path
    Set(SetArgs),

    /// Delete a YANG node
    Delete(DeleteArgs),

    /// Invoke a YANG RPC or action
    Rpc(RpcArgs),

    /// Stream a firmware image to the device
    Firmware(FirmwareArgs),

    /// Search the SID table
    Sid(SidArgs),
}

/// Output format selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Number of pings to send
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// YANG path, e.g. /ietf-interfaces:interfaces
    pub path: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// YANG path to write
    pub path: String,

    /// Value as JSON, e.g. '{"enabled": true}' or '42'
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// YANG path to delete
    pub path: String,
}

#[derive(Args, Debug)]
pub struct RpcArgs {
    /// RPC or action path
    pub path: String,

    /// Input parameters as JSON
    pub params: Option<String>,
}

#[derive(Args, Debug)]
pub struct FirmwareArgs {
    /// Firmware image file
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct SidArgs {
    /// Regex matched against YANG paths
    pub pattern: String,
}
