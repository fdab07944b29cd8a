// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the daemon's control API.

use anyhow::{anyhow, bail, Result};
use serde::de::DeserializeOwned;
use tmx_core::{MuxConfig, Share};
use tmx_daemon::http::api::{
    CreateSessionRequest, CreateShareRequest, OkResponse, SessionResponse, StatusResponse,
};

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &MuxConfig) -> Self {
        let host = config
            .listen_addresses
            .first()
            .map(|a| a.as_str())
            .filter(|a| *a != "0.0.0.0")
            .unwrap_or("127.0.0.1")
            .to_string();
        let base_path = if config.base_path == "/" { "" } else { config.base_path.as_str() };
        let base = format!("http://{host}:{}{base_path}/api", config.daemon_port);
        Self { http: reqwest::Client::new(), base }
    }

    /// Unwrap a JSON response, surfacing the server's `error` string
    /// verbatim on failure.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
                if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
                    bail!("{message}");
                }
            }
            bail!("daemon returned {status}");
        }
        serde_json::from_str(&body).map_err(|e| anyhow!("unexpected daemon response: {e}"))
    }

    fn connect_hint(e: reqwest::Error) -> anyhow::Error {
        if e.is_connect() {
            anyhow!("could not connect to the ttyd-mux daemon — is it running? (try `ttyd-mux daemon start`)")
        } else {
            anyhow!("{e}")
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .map_err(Self::connect_hint)?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .map_err(Self::connect_hint)?;
        Self::decode(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .delete(format!("{}{path}", self.base))
            .send()
            .await
            .map_err(Self::connect_hint)?;
        Self::decode(response).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        self.get("/status").await
    }

    pub async fn sessions(&self) -> Result<Vec<SessionResponse>> {
        self.get("/sessions").await
    }

    pub async fn create_session(&self, request: &CreateSessionRequest) -> Result<SessionResponse> {
        self.post("/sessions", request).await
    }

    pub async fn delete_session(&self, name: &str, kill_tmux: bool) -> Result<OkResponse> {
        self.delete(&format!("/sessions/{name}?killTmux={kill_tmux}")).await
    }

    pub async fn shares(&self) -> Result<Vec<Share>> {
        self.get("/shares").await
    }

    pub async fn create_share(&self, request: &CreateShareRequest) -> Result<Share> {
        self.post("/shares", request).await
    }

    pub async fn delete_share(&self, token: &str) -> Result<OkResponse> {
        self.delete(&format!("/shares/{token}")).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

#[cfg(test)]
impl ApiClient {
    pub(crate) fn base(&self) -> &str {
        &self.base
    }
}
