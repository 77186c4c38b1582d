//! CLI argument definitions for hivetrap-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Hivetrap network capture daemon.
///
/// Captures traffic reaching the sensor host, classifies it against the
/// configured honeypot modules, and streams the resulting events.
#[derive(Parser, Debug)]
#[command(name = "hivetrap-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to hivetrap.toml configuration file.
    #[arg(short, long, default_value = "/etc/hivetrap/hivetrap.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the capture interface (takes precedence over config file).
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
