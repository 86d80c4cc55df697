//! `tglog save`: download new history and write the day logs.

use anyhow::{bail, Context};
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use tglog_store::{CredentialStore, JsonCredentialStore, LogWriter, StoreError};
use tglog_sync::{save_logs, PageTraverser, RateLimiter, SyncError, SyncProgress};

use crate::config::CliConfig;

pub const NOT_LOGGED_IN: &str =
    "You are not logged in. Please run `tglog auth` to authorize this application.";

pub const AUTH_EXPIRED: &str =
    "Your authorization key has expired. Please re-run the authorization script (`tglog auth`).";

pub async fn run(config: &CliConfig) -> anyhow::Result<()> {
    let store = JsonCredentialStore::in_dir(&config.config_dir);
    let credentials = store
        .read()
        .with_context(|| format!("reading {}", store.path().display()))?
        .unwrap_or_default();

    let auth_key = match credentials.require_auth_key() {
        Ok(key) => key.clone(),
        Err(StoreError::NotLoggedIn) => bail!(NOT_LOGGED_IN),
        Err(e) => return Err(e.into()),
    };

    let mut session = crate::gateway_session(config, &credentials, Some(auth_key))?;
    let writer = LogWriter::new(&config.logs_dir);
    let traverser = PageTraverser::new(config.page_size, RateLimiter::new(config.backoff));

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_progress(rx));

    info!(logs = %config.logs_dir.display(), "Saving logs");
    let result = save_logs(&mut session, traverser, Local, Some(tx), &writer).await;
    // The sender went down with the syncer, so the reporter drains and ends.
    let _ = reporter.await;

    match result {
        Ok(summary) => {
            info!(
                peers = summary.peers,
                synced = summary.synced,
                skipped = summary.skipped,
                days = summary.days_written,
                "Finished"
            );
            Ok(())
        }
        Err(e) if is_auth_expired(&e) => {
            error!(error = %e, "Authorization rejected");
            bail!(AUTH_EXPIRED)
        }
        Err(e) => {
            error!(error = %e, "Saving logs failed");
            Err(e.into())
        }
    }
}

fn is_auth_expired(err: &SyncError) -> bool {
    match err {
        SyncError::AuthExpired(_) => true,
        SyncError::Connection(remote) => remote.is_auth_expired(),
        _ => false,
    }
}

async fn report_progress(mut rx: mpsc::UnboundedReceiver<SyncProgress>) {
    while let Some(progress) = rx.recv().await {
        debug!(peer = %progress.peer, "{:.0}%", progress.fraction * 100.0);
    }
}
