//! Clap derive structures for the `loxhook` binary.
//!
//! Every configuration field has a flag here. Flags are optional: an
//! omitted flag leaves the field to the lower configuration layers.

use std::path::PathBuf;

use clap::Parser;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// loxhook -- webhook authorization proxy for Loxone Miniserver
#[derive(Debug, Parser)]
#[command(
    name = "loxhook",
    about = "Authorize webhook requests and forward them to a Loxone Miniserver",
    long_about = "Receives webhook-style HTTP requests, checks the presented secret against\n\
        the loaded control definitions, and forwards allowed commands to the\n\
        Miniserver virtual inputs.\n\n\
        Configuration precedence (lowest first): built-in defaults, config file,\n\
        LOXHOOK_* environment variables, command-line flags.",
    disable_version_flag = true
)]
pub struct Cli {
    /// Print version and build target, then exit
    #[arg(long, short = 'V')]
    pub version: bool,

    /// Config file (LOXHOOK_CONFIG takes precedence) [default: ./loxhook.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Main log file [default: stderr]
    #[arg(long, value_name = "FILE")]
    pub log_file_main: Option<String>,

    /// HTTP error log file [default: stderr]
    #[arg(long, value_name = "FILE")]
    pub log_file_http_error: Option<String>,

    /// HTTP access log file [default: stderr]
    #[arg(long, value_name = "FILE")]
    pub log_file_http_access: Option<String>,

    /// Port to listen on [default: 80]
    #[arg(long, value_name = "PORT", allow_negative_numbers = true)]
    pub listen_port: Option<i64>,

    /// Hostname this service is reachable at, like home.example.com
    #[arg(long, value_name = "HOST")]
    pub public_hostname: Option<String>,

    /// Certificate cache directory [default: ./cache/letsencrypt]
    #[arg(long, value_name = "DIR")]
    pub cert_cache: Option<String>,

    /// Directory holding control definition files [default: ./controls.d]
    #[arg(long, value_name = "DIR")]
    pub controls_dir: Option<String>,

    /// Miniserver URL like http://192.168.1.2:80
    #[arg(long, value_name = "URL")]
    pub miniserver_url: Option<String>,

    /// Miniserver user [default: admin]
    #[arg(long, value_name = "USER")]
    pub miniserver_user: Option<String>,

    /// Miniserver password [default: admin]
    #[arg(long, value_name = "PASSWORD")]
    pub miniserver_password: Option<String>,

    /// Timeout for Miniserver requests in seconds [default: 2]
    #[arg(long, value_name = "SECONDS")]
    pub miniserver_timeout: Option<u64>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}
