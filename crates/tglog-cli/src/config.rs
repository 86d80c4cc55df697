//! Command-line configuration.
//!
//! Defaults first, then `TGLOG_*` environment variables, then flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use tglog_shared::constants::{MAX_PAGE_LIMIT, RATE_LIMIT_BACKOFF_MS};
use tglog_store::paths::{default_config_dir, default_logs_dir};

/// Save every conversation of a messaging account as per-day text logs.
///
/// Settings can also be given as `TGLOG_*` environment variables; flags take
/// precedence.
#[derive(Parser, Debug)]
#[command(name = "tglog", version, about)]
pub struct Cli {
    /// Directory holding config.json [env: TGLOG_CONFIG_DIR]
    #[arg(long, short = 'c', global = true)]
    pub config_dir: Option<PathBuf>,

    /// Root directory of the logs [env: TGLOG_LOGS_DIR]
    #[arg(long, short = 'l', global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Base URL of the protocol gateway [env: TGLOG_GATEWAY_URL]
    #[arg(long, short = 'g', global = true)]
    pub gateway_url: Option<String>,

    /// Items requested per page, at most 100 [env: TGLOG_PAGE_SIZE]
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Download new history and write the logs (default)
    Save,
    /// Sign in and store an authorization key
    #[command(alias = "authorize")]
    Auth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Env: `TGLOG_CONFIG_DIR`
    pub config_dir: PathBuf,

    /// Env: `TGLOG_LOGS_DIR`
    pub logs_dir: PathBuf,

    /// Env: `TGLOG_GATEWAY_URL`
    /// Default: `http://127.0.0.1:8443`
    pub gateway_url: String,

    /// Env: `TGLOG_PAGE_SIZE`
    /// Default: `100`
    pub page_size: u32,

    /// Pause between two page requests.
    /// Env: `TGLOG_BACKOFF_MS`
    /// Default: `500`
    pub backoff: Duration,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            logs_dir: default_logs_dir(),
            gateway_url: "http://127.0.0.1:8443".to_string(),
            page_size: MAX_PAGE_LIMIT,
            backoff: Duration::from_millis(RATE_LIMIT_BACKOFF_MS),
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("TGLOG_CONFIG_DIR") {
            config.config_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("TGLOG_LOGS_DIR") {
            config.logs_dir = PathBuf::from(dir);
        }

        if let Some(url) = lookup("TGLOG_GATEWAY_URL") {
            if !url.trim().is_empty() {
                config.gateway_url = url;
            }
        }

        if let Some(val) = lookup("TGLOG_PAGE_SIZE") {
            match val.parse::<u32>() {
                Ok(n) if (1..=MAX_PAGE_LIMIT).contains(&n) => config.page_size = n,
                _ => tracing::warn!(value = %val, "Invalid TGLOG_PAGE_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("TGLOG_BACKOFF_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.backoff = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %val, "Invalid TGLOG_BACKOFF_MS, using default"),
            }
        }

        config
    }

    /// Apply command-line flags on top.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(dir) = &cli.config_dir {
            self.config_dir = dir.clone();
        }
        if let Some(dir) = &cli.logs_dir {
            self.logs_dir = dir.clone();
        }
        if let Some(url) = &cli.gateway_url {
            self.gateway_url = url.clone();
        }
        if let Some(n) = cli.page_size {
            if (1..=MAX_PAGE_LIMIT).contains(&n) {
                self.page_size = n;
            } else {
                tracing::warn!(value = n, "Invalid --page-size, ignoring");
            }
        }
        self
    }
}
