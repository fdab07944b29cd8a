// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP reverse proxy to a session backend on loopback.
//!
//! Stateless per request: method, path, query, headers, and body are
//! forwarded as-is apart from hop-by-hop headers, a rewritten
//! `Host`/`Origin` (backends run origin checks), and the `X-Forwarded-*`
//! convention. Upstream connect failures answer 502 with a short HTML
//! body. `text/html` responses optionally pass through the
//! [`HtmlRewriter`](super::rewrite::HtmlRewriter) interception point.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{
    CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST, ORIGIN, TE, TRAILER,
    TRANSFER_ENCODING, UPGRADE,
};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use super::rewrite::{
    accepts_gzip, gzip_compress, gzip_decompress, is_html, HtmlRewriter, RewriteCtx,
};

/// Cap on buffered HTML bodies fed to the rewriter.
const MAX_REWRITE_BYTES: usize = 8 * 1024 * 1024;

/// Everything the proxy needs to know about where a request goes, threaded
/// explicitly per request.
pub struct ProxyTarget<'a> {
    pub port: u16,
    /// Path on the backend (query is taken from the inbound request).
    pub path: String,
    pub session_name: &'a str,
    pub base_path: &'a str,
    pub read_only: bool,
    /// Whether the HTML interception point applies to this request.
    pub inject: bool,
}

#[derive(Clone)]
pub struct HttpProxy {
    client: Client<HttpConnector, Body>,
    rewriter: Option<Arc<dyn HtmlRewriter>>,
}

impl HttpProxy {
    pub fn new(rewriter: Option<Arc<dyn HtmlRewriter>>) -> Self {
        let client: Client<HttpConnector, Body> =
            Client::builder(TokioExecutor::new()).build_http();
        Self { client, rewriter }
    }

    pub async fn forward(&self, req: Request<Body>, target: ProxyTarget<'_>) -> Response {
        let (mut parts, body) = req.into_parts();

        let query = parts.uri.query().map(|q| format!("?{q}")).unwrap_or_default();
        let uri = format!("http://127.0.0.1:{}{}{}", target.port, target.path, query);
        parts.uri = match uri.parse() {
            Ok(uri) => uri,
            Err(e) => {
                warn!(error = %e, uri = %uri, "failed to build backend uri");
                return bad_gateway();
            }
        };

        let client_accepts_gzip = accepts_gzip(&parts.headers);
        let client_ip = parts
            .extensions
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|info| info.0.ip().to_string());
        rewrite_request_headers(&mut parts.headers, target.port, client_ip.as_deref());

        let req = Request::from_parts(parts, body);
        let resp = match self.client.request(req).await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(port = target.port, error = %e, "backend request failed");
                return bad_gateway();
            }
        };

        let intercept = target.inject && self.rewriter.is_some() && is_html(resp.headers());
        if !intercept {
            return resp.map(Body::new);
        }
        let Some(rewriter) = self.rewriter.as_deref() else {
            return resp.map(Body::new);
        };

        let (mut parts, body) = resp.into_parts();
        let bytes = match axum::body::to_bytes(Body::new(body), MAX_REWRITE_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to buffer backend html body");
                return bad_gateway();
            }
        };

        // Strip incoming Content-Encoding before the hook sees the body.
        let encoded_gzip = parts
            .headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("gzip"));
        let decoded = if encoded_gzip {
            match gzip_decompress(&bytes) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(error = %e, "backend sent undecodable gzip, passing through");
                    parts.headers.remove(TRANSFER_ENCODING);
                    return Response::from_parts(parts, Body::from(bytes));
                }
            }
        } else {
            bytes.to_vec()
        };

        let ctx = RewriteCtx {
            session_name: target.session_name,
            base_path: target.base_path,
            read_only: target.read_only,
        };
        let html = match String::from_utf8(decoded) {
            Ok(html) => html,
            Err(e) => {
                // Not actually text; hand the original bytes through.
                debug!(error = %e, "html body was not utf-8, skipping rewrite");
                parts.headers.remove(TRANSFER_ENCODING);
                return Response::from_parts(parts, Body::from(bytes));
            }
        };
        let rewritten = rewriter.rewrite(html, &ctx);

        let out = if client_accepts_gzip {
            match gzip_compress(rewritten.as_bytes()) {
                Ok(packed) => {
                    parts
                        .headers
                        .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                    packed
                }
                Err(_) => {
                    parts.headers.remove(CONTENT_ENCODING);
                    rewritten.into_bytes()
                }
            }
        } else {
            parts.headers.remove(CONTENT_ENCODING);
            rewritten.into_bytes()
        };

        parts.headers.remove(TRANSFER_ENCODING);
        parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(out.len() as u64));
        Response::from_parts(parts, Body::from(out))
    }
}

/// Hop-by-hop headers never forwarded to the backend.
const HOP_BY_HOP: [&str; 4] = ["keep-alive", "proxy-authenticate", "proxy-authorization", "proxy-connection"];

fn rewrite_request_headers(headers: &mut HeaderMap, port: u16, client_ip: Option<&str>) {
    headers.remove(CONNECTION);
    headers.remove(TE);
    headers.remove(TRAILER);
    headers.remove(TRANSFER_ENCODING);
    headers.remove(UPGRADE);
    for name in HOP_BY_HOP {
        headers.remove(name);
    }

    let backend_host = format!("127.0.0.1:{port}");
    if let Some(original_host) = headers.remove(HOST) {
        headers.insert("x-forwarded-host", original_host);
    }
    if let Ok(value) = HeaderValue::from_str(&backend_host) {
        headers.insert(HOST, value);
    }
    // Frameworks doing origin checks must see their own origin.
    if headers.contains_key(ORIGIN) {
        if let Ok(value) = HeaderValue::from_str(&format!("http://{backend_host}")) {
            headers.insert(ORIGIN, value);
        }
    }
    headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
    if let Some(ip) = client_ip {
        if let Ok(value) = HeaderValue::from_str(ip) {
            headers.insert("x-forwarded-for", value);
        }
    }
}

/// 502 with a small HTML body, for upstream connect failures.
pub(crate) fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><body><h1>502 Bad Gateway</h1><p>The session backend is not responding.</p></body></html>",
    )
        .into_response()
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
