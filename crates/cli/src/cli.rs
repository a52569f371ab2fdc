//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metric Relay - write metric records to a pool of InfluxDB endpoints
#[derive(Parser, Debug)]
#[command(
    name = "metric-relay",
    author,
    version,
    about = "Relay metric records to InfluxDB endpoints with randomized failover",
    long_about = "Reads metric records, encodes them as line protocol and writes each batch\n\
                  to one endpoint of the configured pool (UDP or HTTP), failing over to\n\
                  the next endpoint in random order when a write fails."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "METRIC_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "METRIC_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Expose Prometheus metrics on this port
    #[arg(long, global = true, env = "METRIC_RELAY_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write JSON-lines metric records to the configured endpoints
    Write(WriteArgs),

    /// Validate configuration file without writing
    Validate(ValidateArgs),

    /// Display resolved endpoints and write settings
    Info(InfoArgs),

    /// Print an annotated sample configuration
    SampleConfig,
}

/// Arguments for the `write` command
#[derive(Parser, Debug, Clone)]
pub struct WriteArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "relay.toml",
        env = "METRIC_RELAY_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON-lines file with one record per line ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Records per write call
    #[arg(long, default_value = "1000", env = "METRIC_RELAY_BATCH_SIZE", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
