//! Tracing setup: one subscriber, three destinations.
//!
//! Events with the access or HTTP error target go to their own log; all
//! other events go to the main log. Each destination is a file from the
//! configuration, or stderr when none is set.

use std::path::{Path, PathBuf};

use tracing::Metadata;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use loxhook_config::EffectiveConfig;

use crate::error::CliError;

/// Target for one line per inbound request.
pub const ACCESS_TARGET: &str = "loxhook::access";

/// Target for every request answered with an error status.
pub const HTTP_ERROR_TARGET: &str = "loxhook::http_error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Main,
    Access,
    HttpError,
}

impl Stream {
    pub fn for_target(target: &str) -> Self {
        match target {
            ACCESS_TARGET => Self::Access,
            HTTP_ERROR_TARGET => Self::HttpError,
            _ => Self::Main,
        }
    }

    fn accepts(self, meta: &Metadata<'_>) -> bool {
        Self::for_target(meta.target()) == self
    }
}

/// Install the global subscriber. The returned guards flush the
/// background writers and must live until the process exits.
pub fn init(config: &EffectiveConfig, verbosity: u8) -> Result<Vec<WorkerGuard>, CliError> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},hyper=warn,reqwest=warn,{ACCESS_TARGET}=info,{HTTP_ERROR_TARGET}=info"
        ))
    });

    let (main, main_guard) = writer(config.log_file_main.as_deref())?;
    let (access, access_guard) = writer(config.log_file_http_access.as_deref())?;
    let (http_error, http_error_guard) = writer(config.log_file_http_error.as_deref())?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(main)
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter_fn(|m| Stream::Main.accepts(m))),
        )
        .with(
            fmt::layer()
                .with_writer(access)
                .with_ansi(false)
                .with_target(false)
                .with_filter(filter_fn(|m| Stream::Access.accepts(m))),
        )
        .with(
            fmt::layer()
                .with_writer(http_error)
                .with_ansi(false)
                .with_target(false)
                .with_filter(filter_fn(|m| Stream::HttpError.accepts(m))),
        )
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(vec![main_guard, access_guard, http_error_guard])
}

fn writer(path: Option<&Path>) -> Result<(NonBlocking, WorkerGuard), CliError> {
    let Some(path) = path else {
        return Ok(tracing_appender::non_blocking(std::io::stderr()));
    };

    let (dir, file_name) = split_log_path(path).ok_or_else(|| CliError::LogFile {
        path: path.to_path_buf(),
        source: "log file path has no file name".into(),
    })?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .map_err(|e| CliError::LogFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
    Ok(tracing_appender::non_blocking(appender))
}

fn split_log_path(path: &Path) -> Option<(PathBuf, String)> {
    let file_name = path.file_name()?.to_str()?.to_owned();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Some((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_route_to_their_stream() {
        assert_eq!(Stream::for_target(ACCESS_TARGET), Stream::Access);
        assert_eq!(Stream::for_target(HTTP_ERROR_TARGET), Stream::HttpError);
        assert_eq!(Stream::for_target("loxhook::server"), Stream::Main);
        assert_eq!(Stream::for_target("loxhook_core::registry"), Stream::Main);
    }

    #[test]
    fn log_path_splits_into_dir_and_name() {
        assert_eq!(
            split_log_path(Path::new("/var/log/loxhook/main.log")),
            Some((PathBuf::from("/var/log/loxhook"), "main.log".to_owned()))
        );
        assert_eq!(
            split_log_path(Path::new("access.log")),
            Some((PathBuf::from("."), "access.log".to_owned()))
        );
        assert_eq!(split_log_path(Path::new("/")), None);
    }
}
