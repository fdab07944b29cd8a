// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control HTTP API, served under `<base_path>/api/`.
//!
//! All JSON; every error body is `{ "error": string }`. The CLI links
//! against the payload types here.

use std::path::PathBuf;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tmx_core::{DaemonRecord, PushKeys, PushSubscription, Session, Share};
use tracing::info;

use crate::lifecycle::ShutdownPlan;
use crate::shares::ShareError;
use crate::supervisor::{StartOptions, StopOptions, SupervisorError};
use tmx_storage::StoreError;

use super::AppState;

/// Session as served by the API: the stored record plus its full URL
/// prefix under the base path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: Session,
    #[serde(rename = "fullPath")]
    pub full_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub daemon: Option<DaemonRecord>,
    pub sessions: Vec<SessionResponse>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub dir: PathBuf,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateShareRequest {
    #[serde(rename = "sessionName")]
    pub session_name: String,
    #[serde(default, rename = "expiresIn")]
    pub expires_in: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ShutdownRequest {
    #[serde(default, rename = "stopSessions")]
    pub stop_sessions: bool,
    #[serde(default, rename = "killTmux")]
    pub kill_tmux: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreatePushRequest {
    pub endpoint: String,
    pub keys: PushKeys,
    #[serde(default, rename = "sessionName")]
    pub session_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StopParams {
    #[serde(default, rename = "killTmux")]
    kill_tmux: bool,
}

/// API error carrying the status code it maps to.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<SupervisorError> for ApiError {
    fn from(e: SupervisorError) -> Self {
        match e {
            SupervisorError::NotFound(_) => ApiError::NotFound(e.to_string()),
            SupervisorError::Store(inner) => ApiError::Internal(inner.to_string()),
            // validation, conflicts, and start failures all map to 400
            _ => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<ShareError> for ApiError {
    fn from(e: ShareError) -> Self {
        match e {
            ShareError::SessionNotFound(_) => ApiError::NotFound(e.to_string()),
            ShareError::Store(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

fn respond_session(session: Session, base_path: &str) -> SessionResponse {
    let full_path = session.full_path(base_path);
    SessionResponse { session, full_path }
}

pub(crate) async fn status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let base_path = state.config.current().base_path.clone();
    let daemon = state.store.daemon()?;
    let sessions = state
        .supervisor
        .list_sessions()?
        .into_iter()
        .map(|s| respond_session(s, &base_path))
        .collect();
    Ok(Json(StatusResponse { daemon, sessions }))
}

pub(crate) async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let base_path = state.config.current().base_path.clone();
    let sessions = state
        .supervisor
        .list_sessions()?
        .into_iter()
        .map(|s| respond_session(s, &base_path))
        .collect();
    Ok(Json(sessions))
}

pub(crate) async fn create_session(
    State(state): State<AppState>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let base_path = state.config.current().base_path.clone();
    let session = state
        .supervisor
        .start_session(StartOptions {
            name: request.name,
            dir: request.dir,
            path: request.path,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(respond_session(session, &base_path))))
}

pub(crate) async fn delete_session(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<StopParams>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .supervisor
        .stop_session(&name, StopOptions { kill_tmux: params.kill_tmux })
        .await?;
    Ok(Json(OkResponse { success: true }))
}

pub(crate) async fn shutdown(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    let request: ShutdownRequest = if body.is_empty() {
        ShutdownRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    info!(
        stop_sessions = request.stop_sessions,
        kill_tmux = request.kill_tmux,
        "shutdown requested via API"
    );

    let shutdown = state.shutdown.clone();
    // Give the reply time to flush before the listeners go away.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.request(ShutdownPlan {
            stop_sessions: request.stop_sessions,
            kill_tmux: request.kill_tmux,
        });
    });
    Ok(Json(OkResponse { success: true }))
}

pub(crate) async fn list_shares(
    State(state): State<AppState>,
) -> Result<Json<Vec<Share>>, ApiError> {
    Ok(Json(state.shares.list_shares()?))
}

pub(crate) async fn create_share(
    State(state): State<AppState>,
    body: Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Share>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let share = state
        .shares
        .create_share(&request.session_name, request.expires_in.as_deref())?;
    Ok((StatusCode::CREATED, Json(share)))
}

pub(crate) async fn get_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Share>, ApiError> {
    match state.shares.validate_share(&token)? {
        Some(share) => Ok(Json(share)),
        None => Err(ApiError::NotFound(format!("share not found: {token}"))),
    }
}

pub(crate) async fn delete_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    if state.shares.revoke_share(&token)? {
        Ok(Json(OkResponse { success: true }))
    } else {
        Err(ApiError::NotFound(format!("share not found: {token}")))
    }
}

pub(crate) async fn list_push_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PushSubscription>>, ApiError> {
    Ok(Json(state.store.push_subscriptions()?))
}

pub(crate) async fn create_push_subscription(
    State(state): State<AppState>,
    body: Result<Json<CreatePushRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PushSubscription>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let subscription = PushSubscription {
        id: uuid::Uuid::new_v4().to_string(),
        endpoint: request.endpoint,
        keys: request.keys,
        session_name: request.session_name,
        created_at: state.clock.now(),
    };
    state.store.add_push_subscription(subscription.clone())?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub(crate) async fn delete_push_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    if state.store.remove_push_subscription(&id)? {
        Ok(Json(OkResponse { success: true }))
    } else {
        Err(ApiError::NotFound(format!("push subscription not found: {id}")))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadParams {
    path: String,
}

/// Serve a file out of a session's working directory. The path must be
/// relative and resolve inside the directory; traversal spellings are
/// rejected before any filesystem access.
pub(crate) async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .store
        .find_session(&name)?
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {name}")))?;

    if !tmx_core::is_relative_path_safe(&params.path) {
        return Err(ApiError::BadRequest(format!("unsafe path: {}", params.path)));
    }

    let target = session.dir.join(&params.path);
    let bytes = match tokio::fs::read(&target).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("file not found: {}", params.path)));
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };
    Ok((
        [(axum::http::header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}

/// 404 for unrecognized `/api/` paths.
pub(crate) async fn unknown_route() -> ApiError {
    ApiError::NotFound("not found".to_string())
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
