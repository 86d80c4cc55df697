//! `tglog auth`: sign in once and store the authorization key.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context};
use tracing::{info, warn};

use tglog_shared::constants::INVALID_LOGIN_CODE;
use tglog_shared::RemoteError;
use tglog_store::{CredentialStore, Credentials, JsonCredentialStore};
use tglog_sync::{LoginSession, RemoteSession};

use crate::config::CliConfig;

/// Source of operator answers.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> std::io::Result<String>;
}

pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{question}")?;
        stdout.flush()?;

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        Ok(line.trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    /// The account lives on another data center, now saved; run again.
    Migrated { data_center: u32 },
}

pub async fn run(config: &CliConfig) -> anyhow::Result<()> {
    let store = JsonCredentialStore::in_dir(&config.config_dir);
    let mut prompt = StdinPrompt;

    let mut credentials = store.read()?.unwrap_or_default();
    if credentials.app.id == 0 || credentials.app.hash.is_empty() {
        ask_app_credentials(&mut prompt, &mut credentials)?;
        store.write(&credentials)?;
    }

    let mut session = crate::gateway_session(config, &credentials, None)?;
    session.connect().await.map_err(describe)?;

    match authorize(&session, &store, credentials, &mut prompt).await? {
        AuthOutcome::Authorized => {
            println!("Authorization successful, run `tglog save` to download your logs.");
        }
        AuthOutcome::Migrated { data_center } => {
            println!(
                "Your account is served by data center {data_center}, which has been saved. \
                 Please run `tglog auth` again."
            );
        }
    }
    Ok(())
}

fn ask_app_credentials(prompt: &mut impl Prompt, credentials: &mut Credentials) -> anyhow::Result<()> {
    let id = prompt.ask("App id: ")?;
    credentials.app.id = id
        .parse()
        .map_err(|_| anyhow!("App id must be a number, got '{id}'"))?;
    credentials.app.hash = prompt.ask("App hash: ")?;
    Ok(())
}

/// Run the login-code exchange and persist the resulting key.
pub async fn authorize<S, C, P>(
    session: &S,
    store: &C,
    mut credentials: Credentials,
    prompt: &mut P,
) -> anyhow::Result<AuthOutcome>
where
    S: LoginSession,
    C: CredentialStore,
    P: Prompt,
{
    let phone = prompt.ask("Enter your phone number (e.g. +12223334444): ")?;

    let sent = match session.send_code(&phone).await {
        Ok(sent) => sent,
        Err(e) => match migrate_target(&e) {
            Some(dc) => {
                let dcs = session.data_centers().await.map_err(describe)?;
                let address = dcs
                    .get(&dc)
                    .with_context(|| format!("Data center {dc} is not in the service's list"))?;
                info!(data_center = dc, %address, "Phone number is served by another data center");
                credentials.app.data_center = address.clone();
                store.write(&credentials)?;
                return Ok(AuthOutcome::Migrated { data_center: dc });
            }
            None => return Err(describe(e)),
        },
    };

    if !sent.phone_registered {
        bail!("The phone number {phone} is not registered with the service");
    }

    let auth_key = loop {
        let code = prompt.ask("Enter the login code you received: ")?;
        match session.sign_in(&phone, &sent.phone_code_hash, &code).await {
            Ok(key) => break key,
            Err(e) if e.rpc_message() == Some("PHONE_PASSWORD_PROTECTED") => return Err(describe(e)),
            Err(e) if e.code() == Some(INVALID_LOGIN_CODE) => {
                warn!(error = %e, "Login code rejected");
                println!("Invalid code, please try again.");
            }
            Err(e) => return Err(describe(e)),
        }
    };

    credentials.auth_key = Some(auth_key);
    store.write(&credentials)?;
    Ok(AuthOutcome::Authorized)
}

/// `PHONE_MIGRATE_<n>` names the data center owning the phone number.
fn migrate_target(err: &RemoteError) -> Option<u32> {
    err.rpc_message()?
        .strip_prefix("PHONE_MIGRATE_")?
        .parse()
        .ok()
}

/// Turn well-known sign-in failures into operator instructions.
fn describe(err: RemoteError) -> anyhow::Error {
    match err.rpc_message() {
        Some("API_ID_INVALID" | "CONNECTION_API_ID_INVALID") => {
            anyhow!("The app id or hash was rejected, check them in config.json")
        }
        Some("PHONE_NUMBER_INVALID") => anyhow!("Invalid phone number"),
        Some("PHONE_PASSWORD_PROTECTED") => {
            anyhow!("Accounts with 2-step verification are not supported")
        }
        _ => anyhow::Error::new(err),
    }
}
