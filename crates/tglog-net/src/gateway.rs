//! [`RemoteSession`] backed by an HTTP gateway.
//!
//! The gateway owns the encrypted connection to the service and exposes it
//! as JSON endpoints:
//!
//! | method | path               | body / query                          |
//! |--------|--------------------|---------------------------------------|
//! | POST   | `/connect`         | app id, hash, data center, auth key   |
//! | GET    | `/dialogs`         | `offset`, `limit`                     |
//! | POST   | `/history`         | input peer, `offset`, `limit`         |
//! | POST   | `/auth/send_code`  | phone number                          |
//! | POST   | `/auth/sign_in`    | phone number, code hash, code         |
//! | GET    | `/data_centers`    |                                       |
//!
//! A failed call answers `{"error_code": 401, "error_message": "..."}`,
//! possibly with a 2xx status.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tglog_shared::constants::DEFAULT_LANGUAGE_CODE;
use tglog_shared::{
    AuthKey, DataCenter, DialogsPage, HistoryPage, InputPeer, RemoteError, SentCode,
};
use tglog_sync::{LoginSession, RemoteSession};

/// Header carrying the session token returned by `/connect`.
const SESSION_HEADER: &str = "x-tglog-session";

/// Login codes are delivered through the service's own app, not SMS.
const SMS_TYPE_APP: u8 = 5;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub app_id: u32,
    pub app_hash: String,
    pub data_center: Option<DataCenter>,
    pub auth_key: Option<AuthKey>,
    pub app_version: String,
}

pub struct GatewaySession {
    config: GatewayConfig,
    http: reqwest::Client,
    token: Option<String>,
}

#[derive(Serialize)]
struct ConnectRequest<'a> {
    app_id: u32,
    app_hash: &'a str,
    app_version: &'a str,
    lang_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_key: Option<&'a AuthKey>,
}

#[derive(Deserialize)]
struct ConnectResponse {
    session: String,
}

#[derive(Serialize)]
struct HistoryRequest<'a> {
    peer: &'a InputPeer,
    offset: u32,
    limit: u32,
}

#[derive(Serialize)]
struct SendCodeRequest<'a> {
    phone_number: &'a str,
    sms_type: u8,
    lang_code: &'a str,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    phone_number: &'a str,
    phone_code_hash: &'a str,
    phone_code: &'a str,
}

impl GatewaySession {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            token: None,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(SESSION_HEADER, token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        decode_response(status.as_u16(), &body)
    }
}

impl RemoteSession for GatewaySession {
    async fn connect(&mut self) -> Result<(), RemoteError> {
        let dc = self.config.data_center.as_ref().map(ToString::to_string);
        debug!(gateway = %self.config.base_url, data_center = ?dc, "Connecting");

        let body = ConnectRequest {
            app_id: self.config.app_id,
            app_hash: &self.config.app_hash,
            app_version: &self.config.app_version,
            lang_code: DEFAULT_LANGUAGE_CODE,
            data_center: dc,
            auth_key: self.config.auth_key.as_ref(),
        };
        let request = self.http.post(self.url("/connect")).json(&body);
        let response: ConnectResponse = self.send(request).await?;

        self.token = Some(response.session);
        Ok(())
    }

    async fn fetch_dialogs_page(&self, offset: u32, limit: u32) -> Result<DialogsPage, RemoteError> {
        debug!(offset, limit, "Fetching dialogs");
        let request = self
            .http
            .get(self.url("/dialogs"))
            .query(&[("offset", offset), ("limit", limit)]);
        self.send(request).await
    }

    async fn fetch_history_page(
        &self,
        peer: &InputPeer,
        offset: u32,
        limit: u32,
    ) -> Result<HistoryPage, RemoteError> {
        debug!(offset, limit, ?peer, "Fetching peer history");
        let request = self.http.post(self.url("/history")).json(&HistoryRequest {
            peer,
            offset,
            limit,
        });
        self.send(request).await
    }
}

impl LoginSession for GatewaySession {
    async fn send_code(&self, phone_number: &str) -> Result<SentCode, RemoteError> {
        let request = self
            .http
            .post(self.url("/auth/send_code"))
            .json(&SendCodeRequest {
                phone_number,
                sms_type: SMS_TYPE_APP,
                lang_code: DEFAULT_LANGUAGE_CODE,
            });
        self.send(request).await
    }

    async fn sign_in(
        &self,
        phone_number: &str,
        phone_code_hash: &str,
        phone_code: &str,
    ) -> Result<AuthKey, RemoteError> {
        let request = self.http.post(self.url("/auth/sign_in")).json(&SignInRequest {
            phone_number,
            phone_code_hash,
            phone_code,
        });
        self.send(request).await
    }

    async fn data_centers(&self) -> Result<BTreeMap<u32, String>, RemoteError> {
        self.send(self.http.get(self.url("/data_centers"))).await
    }
}

/// Turn a gateway answer into `T` or the error it reports.
fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, RemoteError> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !(200..300).contains(&status) => {
            return Err(RemoteError::rpc(i32::from(status), body.trim()));
        }
        Err(e) => return Err(RemoteError::Malformed(format!("invalid JSON: {e}"))),
    };

    if let Some(code) = value.get("error_code").and_then(serde_json::Value::as_i64) {
        let message = value
            .get("error_message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("(no message)");
        return Err(RemoteError::rpc(code as i32, message));
    }

    if !(200..300).contains(&status) {
        return Err(RemoteError::rpc(i32::from(status), value.to_string()));
    }

    if !value.is_object() && !value.is_array() {
        return Err(RemoteError::Malformed(format!("expected a record, got {value}")));
    }

    serde_json::from_value(value).map_err(|e| RemoteError::Malformed(e.to_string()))
}
