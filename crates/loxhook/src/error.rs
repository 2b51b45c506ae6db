//! Startup error types with miette diagnostics.
//!
//! Everything that can abort the process before it serves traffic ends up
//! here, with help text and a distinct exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use loxhook_config::ConfigError;
use loxhook_core::ControlError;

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    /// Used by clap for argument errors.
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CONTROLS: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration")]
    #[diagnostic(
        code(loxhook::config),
        help(
            "Settings are read from ./loxhook.toml (or LOXHOOK_CONFIG / --config),\n\
             LOXHOOK_* environment variables and command-line flags.\n\
             Run: loxhook --help"
        )
    )]
    Config(#[source] ConfigError),

    #[error("Cannot load control definitions")]
    #[diagnostic(
        code(loxhook::controls),
        help("Fix the reported definition file in the controls directory and restart.")
    )]
    Controls(#[source] ControlError),

    // ── Miniserver ───────────────────────────────────────────────────
    #[error("Cannot reach Miniserver at {url}")]
    #[diagnostic(
        code(loxhook::miniserver_unreachable),
        help(
            "Check that the Miniserver is running and that miniserver_url is correct.\n\
             The probe requests {url}jdev/cfg/api and expects status 200."
        )
    )]
    MiniserverUnreachable {
        url: String,
        #[source]
        source: loxhook_api::Error,
    },

    #[error("Miniserver at {url} did not answer within {seconds}s")]
    #[diagnostic(
        code(loxhook::miniserver_timeout),
        help("Increase miniserver_timeout or check the network path to the Miniserver.")
    )]
    MiniserverTimeout { url: String, seconds: u64 },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Cannot open log file {}", path.display())]
    #[diagnostic(code(loxhook::log_file))]
    LogFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Cannot install the log subscriber: {0}")]
    #[diagnostic(code(loxhook::logging))]
    Logging(String),

    #[error("Cannot listen on port {port}")]
    #[diagnostic(
        code(loxhook::bind),
        help("Another process may hold the port, or binding below 1024 needs extra privileges.")
    )]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ControlError> for CliError {
    fn from(err: ControlError) -> Self {
        Self::Controls(err)
    }
}

impl CliError {
    /// Classify a failed Miniserver probe.
    pub fn from_probe(url: &impl std::fmt::Display, err: loxhook_api::Error) -> Self {
        match err {
            loxhook_api::Error::Timeout { timeout_secs } => Self::MiniserverTimeout {
                url: url.to_string(),
                seconds: timeout_secs,
            },
            source => Self::MiniserverUnreachable {
                url: url.to_string(),
                source,
            },
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::Controls(_) => exit_code::CONTROLS,
            Self::MiniserverUnreachable { .. } => exit_code::CONNECTION,
            Self::MiniserverTimeout { .. } => exit_code::TIMEOUT,
            Self::LogFile { .. } | Self::Logging(_) | Self::Bind { .. } | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }
}
