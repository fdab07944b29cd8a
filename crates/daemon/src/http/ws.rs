// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket reverse proxy.
//!
//! The backend connection is opened first (forwarding the inbound
//! sub-protocols); only once it is up is the client upgrade completed.
//! Two tasks then forward frames, one per direction, preserving
//! within-direction order. Close coordination is single-shot: whichever
//! side closes or errors first wins, and the other side is closed exactly
//! once with the mirrored code and reason.
//!
//! Read-only mode implements the share policy: the backend's terminal
//! protocol uses the first byte of each binary frame as a command byte,
//! and `'0'` (0x30) carries keyboard input. Those frames are dropped
//! client→backend; nothing else is touched, and backend→client traffic is
//! never filtered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{
    CloseFrame as ClientCloseFrame, Message as ClientMessage, WebSocket, WebSocketUpgrade,
};
use axum::http::header::SEC_WEBSOCKET_PROTOCOL;
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as BackendCloseFrame;
use tokio_tungstenite::tungstenite::Message as BackendMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::proxy::bad_gateway;

/// Command byte for client keyboard input in the terminal wire protocol.
pub const INPUT_COMMAND: u8 = 0x30;

type BackendSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where an upgrade is bridged to.
pub struct WsTarget {
    pub port: u16,
    /// Path (plus query) on the backend.
    pub path: String,
    pub read_only: bool,
}

/// Open the backend socket, then complete the client upgrade and bridge.
pub async fn proxy_upgrade(
    upgrade: WebSocketUpgrade,
    headers: &HeaderMap,
    target: WsTarget,
) -> Response {
    let url = format!("ws://127.0.0.1:{}{}", target.port, target.path);
    let mut request = match url.clone().into_client_request() {
        Ok(request) => request,
        Err(e) => {
            warn!(url = %url, error = %e, "failed to build backend ws request");
            return bad_gateway();
        }
    };

    // Forward the inbound sub-protocol offer verbatim.
    if let Some(offered) = headers.get(SEC_WEBSOCKET_PROTOCOL) {
        request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, offered.clone());
    }

    let (backend, response) = match connect_async(request).await {
        Ok(connected) => connected,
        Err(e) => {
            debug!(url = %url, error = %e, "backend ws connect failed");
            return bad_gateway();
        }
    };

    // Echo whichever sub-protocol the backend selected.
    let negotiated = response
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let upgrade = match negotiated {
        Some(protocol) => upgrade.protocols([protocol]),
        None => upgrade,
    };

    let read_only = target.read_only;
    upgrade.on_upgrade(move |client| bridge(client, backend, read_only))
}

/// Run both forwarding directions until one side ends.
pub(crate) async fn bridge(client: WebSocket, backend: BackendSocket, read_only: bool) {
    let (backend_tx, backend_rx) = backend.split();
    let (client_tx, client_rx) = client.split();
    let closed = Arc::new(AtomicBool::new(false));

    let c2b = tokio::spawn(client_to_backend(client_rx, backend_tx, read_only, closed.clone()));
    let b2c = tokio::spawn(backend_to_client(backend_rx, client_tx, closed));
    let _ = tokio::join!(c2b, b2c);
    debug!("ws bridge finished");
}

async fn client_to_backend(
    mut rx: SplitStream<WebSocket>,
    mut tx: SplitSink<BackendSocket, BackendMessage>,
    read_only: bool,
    closed: Arc<AtomicBool>,
) {
    loop {
        match rx.next().await {
            Some(Ok(ClientMessage::Close(frame))) => {
                // First close event wins; mirror code and reason across.
                if !closed.swap(true, Ordering::SeqCst) {
                    let _ = tx.send(BackendMessage::Close(frame.map(close_to_backend))).await;
                }
                return;
            }
            Some(Ok(message)) => {
                if read_only && is_input_frame(&message) {
                    continue;
                }
                if tx.send(client_message_to_backend(message)).await.is_err() {
                    // Destination no longer open: drop the frame, tear down.
                    closed.store(true, Ordering::SeqCst);
                    return;
                }
            }
            Some(Err(e)) => {
                debug!(error = %e, "client ws error, terminating bridge");
                if !closed.swap(true, Ordering::SeqCst) {
                    // Abrupt teardown; the peer observes an abnormal close.
                    let _ = tx.close().await;
                }
                return;
            }
            None => {
                if !closed.swap(true, Ordering::SeqCst) {
                    let _ = tx.send(BackendMessage::Close(None)).await;
                }
                return;
            }
        }
    }
}

async fn backend_to_client(
    mut rx: SplitStream<BackendSocket>,
    mut tx: SplitSink<WebSocket, ClientMessage>,
    closed: Arc<AtomicBool>,
) {
    loop {
        match rx.next().await {
            Some(Ok(BackendMessage::Close(frame))) => {
                if !closed.swap(true, Ordering::SeqCst) {
                    let _ = tx.send(ClientMessage::Close(frame.map(close_to_client))).await;
                }
                return;
            }
            Some(Ok(message)) => {
                let Some(message) = backend_message_to_client(message) else {
                    continue;
                };
                if tx.send(message).await.is_err() {
                    closed.store(true, Ordering::SeqCst);
                    return;
                }
            }
            Some(Err(e)) => {
                debug!(error = %e, "backend ws error, terminating bridge");
                if !closed.swap(true, Ordering::SeqCst) {
                    let _ = tx.close().await;
                }
                return;
            }
            None => {
                if !closed.swap(true, Ordering::SeqCst) {
                    let _ = tx.send(ClientMessage::Close(None)).await;
                }
                return;
            }
        }
    }
}

/// The read-only filter: exactly one byte is inspected, never more.
pub(crate) fn is_input_frame(message: &ClientMessage) -> bool {
    matches!(message, ClientMessage::Binary(payload) if payload.first() == Some(&INPUT_COMMAND))
}

pub(crate) fn client_message_to_backend(message: ClientMessage) -> BackendMessage {
    match message {
        ClientMessage::Text(text) => BackendMessage::Text(text.as_str().into()),
        ClientMessage::Binary(payload) => BackendMessage::Binary(payload),
        ClientMessage::Ping(payload) => BackendMessage::Ping(payload),
        ClientMessage::Pong(payload) => BackendMessage::Pong(payload),
        ClientMessage::Close(frame) => BackendMessage::Close(frame.map(close_to_backend)),
    }
}

pub(crate) fn backend_message_to_client(message: BackendMessage) -> Option<ClientMessage> {
    match message {
        BackendMessage::Text(text) => Some(ClientMessage::Text(text.as_str().into())),
        BackendMessage::Binary(payload) => Some(ClientMessage::Binary(payload)),
        BackendMessage::Ping(payload) => Some(ClientMessage::Ping(payload)),
        BackendMessage::Pong(payload) => Some(ClientMessage::Pong(payload)),
        BackendMessage::Close(frame) => Some(ClientMessage::Close(frame.map(close_to_client))),
        // Raw frames never surface from a read loop.
        BackendMessage::Frame(_) => None,
    }
}

fn close_to_backend(frame: ClientCloseFrame) -> BackendCloseFrame {
    BackendCloseFrame {
        code: CloseCode::from(frame.code),
        reason: frame.reason.as_str().to_string().into(),
    }
}

fn close_to_client(frame: BackendCloseFrame) -> ClientCloseFrame {
    ClientCloseFrame { code: frame.code.into(), reason: frame.reason.to_string().into() }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
