//! Glue between parsed flags and the configuration resolver.

use loxhook_config::FlagOverrides;

use crate::cli::Cli;

/// Collect the command-line layer from parsed flags.
pub fn flag_overrides(cli: &Cli) -> FlagOverrides {
    FlagOverrides {
        config_file: cli.config.clone(),
        log_file_main: cli.log_file_main.clone(),
        log_file_http_error: cli.log_file_http_error.clone(),
        log_file_http_access: cli.log_file_http_access.clone(),
        listen_port: cli.listen_port,
        public_hostname: cli.public_hostname.clone(),
        cert_cache: cli.cert_cache.clone(),
        controls_dir: cli.controls_dir.clone(),
        miniserver_url: cli.miniserver_url.clone(),
        miniserver_user: cli.miniserver_user.clone(),
        miniserver_password: cli.miniserver_password.clone(),
        miniserver_timeout: cli.miniserver_timeout,
    }
}
