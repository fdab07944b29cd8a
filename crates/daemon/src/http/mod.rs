// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of the daemon.
//!
//! One listener serves four kinds of traffic, classified in order: the
//! portal page at the base path, the control API under `/api/`, share
//! entry points under `/s/` and `/share/`, and everything under a known
//! session prefix, which is reverse-proxied (HTTP or WebSocket) to that
//! session's backend. Anything else is 404.
//!
//! Ties cannot occur: session names may not be `api`, `s`, or `share`, so
//! the prefixes stay disjoint.

pub mod api;
mod portal;
pub mod proxy;
pub mod rewrite;
pub mod ws;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, State, WebSocketUpgrade};
use axum::http::header::UPGRADE;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tmx_core::{Clock, MuxConfig, Session, TOKEN_LEN};
use tmx_storage::StateStore;
use tracing::debug;

use crate::lifecycle::ShutdownSignal;
use crate::resolver;
use crate::settings::ConfigHandle;
use crate::shares::ShareManager;
use crate::supervisor::SessionSupervisor;

use api::ApiError;
use proxy::{HttpProxy, ProxyTarget};
use ws::WsTarget;

/// Shared handles for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub supervisor: Arc<SessionSupervisor>,
    pub shares: Arc<ShareManager>,
    pub clock: Arc<dyn Clock>,
    pub config: ConfigHandle,
    pub shutdown: Arc<ShutdownSignal>,
    pub proxy: HttpProxy,
}

/// Build the daemon's router for the configured base path. The base path
/// requires a restart to change, so wiring it statically here is safe.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(api::status))
        .route("/sessions", get(api::list_sessions).post(api::create_session))
        .route("/sessions/{name}", delete(api::delete_session))
        .route("/sessions/{name}/file", get(api::download_file))
        .route("/shutdown", post(api::shutdown))
        .route("/shares", get(api::list_shares).post(api::create_share))
        .route("/shares/{token}", get(api::get_share).delete(api::delete_share))
        .route(
            "/push-subscriptions",
            get(api::list_push_subscriptions).post(api::create_push_subscription),
        )
        .route("/push-subscriptions/{id}", delete(api::delete_push_subscription))
        .fallback(api::unknown_route);

    let base = state.config.current().base_path.clone();
    let app = if base == "/" {
        Router::new().route("/", get(portal::page)).nest("/api", api)
    } else {
        Router::new()
            .route(&base, get(portal::page))
            .route(&format!("{base}/"), get(portal::page))
            .nest(&format!("{base}/api"), api)
    };

    app.fallback(dispatch).with_state(state)
}

/// Fallback classifier: share entries, then session prefixes, then 404.
async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_string();
    let config = state.config.current();

    if let Some((token, rest)) = parse_share_path(&config.base_path, &path) {
        if !is_token_shaped(&token) {
            return ApiError::BadRequest("invalid share token".to_string()).into_response();
        }
        let share = match state.shares.validate_share(&token) {
            Ok(Some(share)) => share,
            Ok(None) => return not_found(),
            Err(e) => return ApiError::Internal(e.to_string()).into_response(),
        };
        let sessions = match state.supervisor.list_sessions() {
            Ok(sessions) => sessions,
            Err(e) => return ApiError::Internal(e.to_string()).into_response(),
        };
        let Some(session) = resolver::find_by_name(&sessions, &share.session_name).cloned()
        else {
            // dangling share: the session was stopped after it was minted
            debug!(session = %share.session_name, "share resolves to no live session");
            return not_found();
        };
        // Rewrite the URL: the session prefix replaces the share prefix.
        let backend_path = format!("{}{rest}", session.full_path(&config.base_path));
        return to_session(state, req, &session, backend_path, true, &config).await;
    }

    let sessions = match state.supervisor.list_sessions() {
        Ok(sessions) => sessions,
        Err(e) => return ApiError::Internal(e.to_string()).into_response(),
    };
    if let Some(resolved) = resolver::resolve_by_path(&sessions, &config.base_path, &path) {
        // Session traffic keeps its path: backends serve under their full
        // URL prefix.
        let session = resolved.session;
        return to_session(state, req, &session, path, false, &config).await;
    }

    not_found()
}

/// Hand a classified request to the HTTP or WebSocket proxy.
async fn to_session(
    state: AppState,
    req: Request<Body>,
    session: &Session,
    backend_path: String,
    read_only: bool,
    config: &MuxConfig,
) -> Response {
    if is_upgrade(req.headers()) {
        let (mut parts, _body) = req.into_parts();
        let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(upgrade) => upgrade,
            Err(rejection) => return rejection.into_response(),
        };
        let query = parts.uri.query().map(|q| format!("?{q}")).unwrap_or_default();
        return ws::proxy_upgrade(
            upgrade,
            &parts.headers,
            WsTarget {
                port: session.port,
                path: format!("{backend_path}{query}"),
                read_only,
            },
        )
        .await;
    }

    let inject = config.inject_html && (!read_only || config.share_inject_html);
    state
        .proxy
        .forward(
            req,
            ProxyTarget {
                port: session.port,
                path: backend_path,
                session_name: &session.name,
                base_path: &config.base_path,
                read_only,
                inject,
            },
        )
        .await
}

fn is_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

fn is_token_shaped(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Extract `(token, rest)` from a share entry path under the base path.
fn parse_share_path(base_path: &str, path: &str) -> Option<(String, String)> {
    for marker in ["/s/", "/share/"] {
        let prefix = if base_path == "/" {
            marker.to_string()
        } else {
            format!("{base_path}{marker}")
        };
        if let Some(after) = path.strip_prefix(&prefix) {
            let (token, rest) = match after.find('/') {
                Some(split) => after.split_at(split),
                None => (after, ""),
            };
            if token.is_empty() {
                return None;
            }
            return Some((token.to_string(), rest.to_string()));
        }
    }
    None
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))).into_response()
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
