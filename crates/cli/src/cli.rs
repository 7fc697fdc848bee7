//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// healthsync - Capture ingestion for personal health devices
#[derive(Parser, Debug)]
#[command(
    name = "healthsync",
    author,
    version,
    about = "Health capture ingestion pipeline",
    long_about = "Watches per-device hot folders for screenshots and sensor exports,\n\
                  assembles complete capture sets, extracts canonical metrics, \n\
                  appends new rows to the record store and archives the sources."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "HEALTHSYNC_VERBOSE")]
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
        env = "HEALTHSYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the hot folders and ingest captures until interrupted
    Run(RunArgs),

    /// Process everything already in the hot folders, then exit
    Scan(ScanArgs),

    /// Extract metrics from one capture without uploading or archiving
    Extract(ExtractArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "healthsync.toml", env = "HEALTHSYNC_CONFIG")]
    pub config: PathBuf,

    /// Log rows instead of writing them to the configured store
    #[arg(long)]
    pub dry_run: bool,

    /// Skip processing of files already present at startup
    #[arg(long)]
    pub skip_startup_scan: bool,

    /// Override the periodic full rescan interval in seconds (0 = off)
    #[arg(long, env = "HEALTHSYNC_RESCAN_SECS")]
    pub rescan_interval: Option<u64>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "HEALTHSYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `scan` command
#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "healthsync.toml", env = "HEALTHSYNC_CONFIG")]
    pub config: PathBuf,

    /// Log rows instead of writing them to the configured store
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `extract` command
#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "healthsync.toml", env = "HEALTHSYNC_CONFIG")]
    pub config: PathBuf,

    /// Device id whose analyzer to use
    #[arg(short, long)]
    pub device: String,

    /// Capture file (image, or any member of a sensor export set)
    pub input: PathBuf,

    /// Treat the input as already recognized text
    #[arg(long)]
    pub text: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "healthsync.toml", env = "HEALTHSYNC_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "healthsync.toml", env = "HEALTHSYNC_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show analyzer details per device
    #[arg(long)]
    pub devices: bool,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "healthsync",
            "-v",
            "extract",
            "--device",
            "starfit",
            "IMG_20240101_a.jpg",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.device, "starfit");
        assert!(args.json);
        assert!(!args.text);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["healthsync", "-q", "-v", "info"]).is_err());
    }
}
