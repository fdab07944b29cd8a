// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::test_support::test_app;
use super::super::router;
use super::*;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn status_on_a_clean_host() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, value) = send(&app, get("/ttyd-mux/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["daemon"], serde_json::Value::Null);
    assert_eq!(value["sessions"], serde_json::json!([]));
}

#[tokio::test]
async fn session_create_allocates_port_path_and_full_path() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, value) =
        send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo", "dir": "/tmp"})))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(value["name"], "demo");
    assert_eq!(value["port"], 7601);
    assert_eq!(value["path"], "/demo");
    assert_eq!(value["fullPath"], "/ttyd-mux/demo");

    let (status, value) = send(&app, get("/ttyd-mux/api/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["name"], "demo");
}

#[tokio::test]
async fn second_session_gets_the_next_port() {
    let fixture = test_app();
    let app = router(fixture.state);

    send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "a", "dir": "/tmp/a"})))
        .await;
    let (_, value) =
        send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "b", "dir": "/tmp/b"})))
            .await;
    assert_eq!(value["port"], 7602);
}

#[tokio::test]
async fn weird_names_are_stored_sanitized() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, value) = send(
        &app,
        post("/ttyd-mux/api/sessions", serde_json::json!({"name": "weird name!", "dir": "/tmp"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(value["name"], "weird_name_");
}

#[tokio::test]
async fn missing_dir_is_a_400_with_error_body() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, value) =
        send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].is_string());
}

#[tokio::test]
async fn duplicate_session_is_a_400() {
    let fixture = test_app();
    let app = router(fixture.state);

    send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo", "dir": "/tmp"})))
        .await;
    let (status, value) =
        send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo", "dir": "/tmp"})))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("already running"));
}

#[tokio::test]
async fn delete_session_stops_it_and_honors_kill_tmux() {
    let fixture = test_app();
    let app = router(fixture.state);

    send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo", "dir": "/tmp"})))
        .await;
    let (status, value) =
        send(&app, delete("/ttyd-mux/api/sessions/demo?killTmux=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);

    let commands = fixture.runner.commands();
    assert!(commands.iter().any(|(program, args)| program == "tmux" && args[0] == "kill-session"));

    let (status, _) = send(&app, delete("/ttyd-mux/api/sessions/demo")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn share_round_trip_create_get_revoke() {
    let fixture = test_app();
    let app = router(fixture.state);

    send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo", "dir": "/tmp"})))
        .await;

    let (status, value) = send(
        &app,
        post("/ttyd-mux/api/shares", serde_json::json!({"sessionName": "demo", "expiresIn": "30m"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = value["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 32);
    assert!(token.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));

    let (status, value) = send(&app, get(&format!("/ttyd-mux/api/shares/{token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["sessionName"], "demo");

    let (status, value) = send(&app, delete(&format!("/ttyd-mux/api/shares/{token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);

    let (status, _) = send(&app, get(&format!("/ttyd-mux/api/shares/{token}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_share_is_gone_from_the_api() {
    let fixture = test_app();
    let app = router(fixture.state.clone());

    send(&app, post("/ttyd-mux/api/sessions", serde_json::json!({"name": "demo", "dir": "/tmp"})))
        .await;
    let (_, value) = send(
        &app,
        post("/ttyd-mux/api/shares", serde_json::json!({"sessionName": "demo", "expiresIn": "30m"})),
    )
    .await;
    let token = value["token"].as_str().unwrap().to_string();

    fixture.clock.advance(chrono::Duration::minutes(31));

    let (status, _) = send(&app, get(&format!("/ttyd-mux/api/shares/{token}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, get("/ttyd-mux/api/shares")).await;
    assert_eq!(listed, serde_json::json!([]));
}

#[tokio::test]
async fn share_for_unknown_session_is_404() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, _) =
        send(&app, post("/ttyd-mux/api/shares", serde_json::json!({"sessionName": "ghost"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn push_subscriptions_round_trip() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, value) = send(
        &app,
        post(
            "/ttyd-mux/api/push-subscriptions",
            serde_json::json!({
                "endpoint": "https://push.example/ep",
                "keys": {"p256dh": "pk", "auth": "a"},
                "sessionName": "demo"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = value["id"].as_str().unwrap().to_string();

    let (_, listed) = send(&app, get("/ttyd-mux/api/push-subscriptions")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, delete(&format!("/ttyd-mux/api/push-subscriptions/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn file_download_is_confined_to_the_session_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello from the session dir").unwrap();

    let fixture = test_app();
    let app = router(fixture.state);
    send(
        &app,
        post(
            "/ttyd-mux/api/sessions",
            serde_json::json!({"name": "demo", "dir": dir.path().to_str().unwrap()}),
        ),
    )
    .await;

    // a safe relative path is served
    let response = app
        .clone()
        .oneshot(get("/ttyd-mux/api/sessions/demo/file?path=notes.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    assert_eq!(&bytes[..], b"hello from the session dir");

    // traversal is refused before touching the filesystem
    let (status, value) =
        send(&app, get("/ttyd-mux/api/sessions/demo/file?path=../../etc/passwd")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("unsafe path"));

    // missing files are 404
    let (status, _) = send(&app, get("/ttyd-mux/api/sessions/demo/file?path=nope.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // unknown sessions are 404
    let (status, _) = send(&app, get("/ttyd-mux/api/sessions/ghost/file?path=notes.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_api_route_is_a_json_404() {
    let fixture = test_app();
    let app = router(fixture.state);

    let (status, value) = send(&app, get("/ttyd-mux/api/frobnicate")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["error"], "not found");
}

#[tokio::test]
async fn shutdown_replies_first_then_requests_exit() {
    let fixture = test_app();
    let app = router(fixture.state.clone());

    let (status, value) = send(
        &app,
        post("/ttyd-mux/api/shutdown", serde_json::json!({"stopSessions": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    // the exit is scheduled, not immediate
    assert!(!fixture.state.shutdown.is_requested());

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(fixture.state.shutdown.is_requested());
    assert!(fixture.state.shutdown.plan().stop_sessions);
}
