// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interception point for proxied HTML responses.
//!
//! Collaborators (toolbar injection, PWA tags) install an [`HtmlRewriter`];
//! the core only guarantees the surrounding plumbing is correct: the body
//! is decoded before the hook runs, re-encoded as gzip only when the
//! client advertised it, and `Content-Length` always matches what is sent.

use std::io::{Read, Write};

use axum::http::header::{ACCEPT_ENCODING, CONTENT_TYPE};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Per-request context handed to the rewriter, threaded explicitly rather
/// than stashed on the request.
pub struct RewriteCtx<'a> {
    pub session_name: &'a str,
    pub base_path: &'a str,
    pub read_only: bool,
}

/// Hook over `text/html` response bodies from backends.
pub trait HtmlRewriter: Send + Sync {
    fn rewrite(&self, html: String, ctx: &RewriteCtx<'_>) -> String;
}

/// Whether a response should be routed through the rewriter.
pub(crate) fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("text/html"))
}

/// Whether the client advertised gzip support.
pub(crate) fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|enc| enc.trim().starts_with("gzip")))
}

pub(crate) fn gzip_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

pub(crate) fn gzip_decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
