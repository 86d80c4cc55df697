//! # tglog
//!
//! Saves every conversation of a messaging account as plain-text logs, one
//! file per peer and calendar day, downloading only what is new since the
//! previous run.
//!
//! - `tglog auth` signs in once and stores the authorization key
//! - `tglog save` (the default) syncs every dialog into the logs directory

mod authorize;
mod config;
mod save;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tglog_net::{GatewayConfig, GatewaySession};
use tglog_shared::{AuthKey, DataCenter};
use tglog_store::Credentials;

use crate::config::{Cli, CliConfig, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tglog=debug,tglog_sync=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env().with_cli(&cli);
    info!(?config, "Loaded configuration");

    match cli.command.unwrap_or(Command::Save) {
        Command::Save => save::run(&config).await,
        Command::Auth => authorize::run(&config).await,
    }
}

/// Gateway session for the stored app registration.
pub(crate) fn gateway_session(
    config: &CliConfig,
    credentials: &Credentials,
    auth_key: Option<AuthKey>,
) -> anyhow::Result<GatewaySession> {
    let data_center = credentials
        .data_center()
        .map(str::parse::<DataCenter>)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("Invalid data center in config.json")?;

    Ok(GatewaySession::new(GatewayConfig {
        base_url: config.gateway_url.clone(),
        app_id: credentials.app.id,
        app_hash: credentials.app.hash.clone(),
        data_center,
        auth_key,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
