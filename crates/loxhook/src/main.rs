mod cli;
mod config;
mod error;
mod logging;
mod server;

use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use loxhook_api::{Credentials, MiniserverClient, TransportConfig};
use loxhook_core::{RateLimiter, Registry};

use crate::cli::Cli;
use crate::error::CliError;
use crate::server::AppState;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("loxhook {}", env!("CARGO_PKG_VERSION"));
        println!("build target: {}", env!("LOXHOOK_BUILD_TARGET"));
        return;
    }

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let cfg = loxhook_config::load(&config::flag_overrides(&cli))?;

    let _guards = logging::init(&cfg, cli.verbose)?;
    if let Some(path) = &cfg.missing_config_file {
        warn!(path = %path.display(), "config file not found, continuing without it");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "starting loxhook\n{cfg}");

    let transport = TransportConfig::new(
        cfg.miniserver_timeout,
        Credentials::new(cfg.miniserver_user.clone(), cfg.miniserver_password.clone()),
    );
    let miniserver = MiniserverClient::new(cfg.miniserver_url.clone(), &transport)
        .map_err(|e| CliError::from_probe(&cfg.miniserver_url, e))?;
    miniserver
        .probe()
        .await
        .map_err(|e| CliError::from_probe(&cfg.miniserver_url, e))?;
    info!(url = %cfg.miniserver_url, "miniserver reachable");

    let registry = Registry::load(&cfg.controls_dir)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cfg.listen_port));
    let listener = TcpListener::bind(addr).await.map_err(|source| CliError::Bind {
        port: cfg.listen_port,
        source,
    })?;

    let state = AppState::new(registry, miniserver, RateLimiter::default());
    server::serve(listener, state).await?;
    Ok(())
}
