// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal portal page at the base path.
//!
//! The full browser portal (toolbar, PWA assets) ships separately; the
//! daemon itself serves a plain session index so the base URL is always
//! useful.

use axum::extract::State;
use axum::response::Html;

use super::AppState;

pub(crate) async fn page(State(state): State<AppState>) -> Html<String> {
    let config = state.config.current();
    let sessions = state.supervisor.list_sessions().unwrap_or_default();

    let mut rows = String::new();
    if sessions.is_empty() {
        rows.push_str("<li><em>no sessions</em></li>");
    }
    for session in &sessions {
        let href = session.full_path(&config.base_path);
        rows.push_str(&format!(
            "<li><a href=\"{href}/\">{name}</a> <code>{dir}</code></li>",
            name = session.name,
            dir = session.dir.display(),
        ));
    }

    Html(format!(
        "<!doctype html><html><head><title>ttyd-mux</title></head>\
         <body><h1>ttyd-mux</h1><ul>{rows}</ul></body></html>"
    ))
}
