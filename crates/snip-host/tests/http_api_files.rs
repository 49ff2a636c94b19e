use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use snip_core::{FileStore, SavePolicy, TRASH_DIR};
use snip_host::http::{self, HttpState};
use snip_host::runner::{Runner, RunnerConfig};

async fn spawn_server(
    policy: SavePolicy,
) -> (SocketAddr, tempfile::TempDir, tokio::task::JoinHandle<()>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::open(dir.path(), policy).expect("open store");
    let state = HttpState::new(
        Arc::new(store),
        Arc::new(Runner::new(RunnerConfig::default())),
    );
    let app = http::app(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (addr, dir, server)
}

#[tokio::test]
async fn save_patch_read_roundtrip() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("http://{addr}/api/files/hello.jac"))
        .json(&json!({"code": "hello world"}))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["success"], true);

    let response = client
        .patch(format!("http://{addr}/api/files/hello.jac"))
        .json(&json!({"command": "s/hello/hi/g"}))
        .send()
        .await
        .expect("patch");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["success"], true);
    assert_eq!(body["content"], "hi world");

    let response = client
        .get(format!("http://{addr}/api/files/hello.jac"))
        .send()
        .await
        .expect("get");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["content"], "hi world");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn read_missing_file_names_it_in_the_error() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;

    let response = reqwest::get(format!("http://{addr}/api/files/nonexistent.jac"))
        .await
        .expect("get");
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "file_not_found");
    let message = body["message"].as_str().expect("message");
    assert!(message.contains("nonexistent.jac"));

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn delete_moves_to_trash_and_second_delete_fails() {
    let (addr, dir, server) = spawn_server(SavePolicy::Overwrite).await;
    let client = reqwest::Client::new();

    client
        .put(format!("http://{addr}/api/files/test.jac"))
        .json(&json!({"code": "keep me"}))
        .send()
        .await
        .expect("put");

    let response = client
        .delete(format!("http://{addr}/api/files/test.jac"))
        .send()
        .await
        .expect("delete");
    assert_eq!(response.status(), 200);

    assert!(!dir.path().join("test.jac").exists());
    let trashed = dir.path().join(TRASH_DIR).join("test.jac");
    assert_eq!(
        std::fs::read_to_string(&trashed).expect("read trash"),
        "keep me"
    );

    let response = client
        .delete(format!("http://{addr}/api/files/test.jac"))
        .send()
        .await
        .expect("second delete");
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["code"], "file_not_found");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("http://{addr}/api/files/notes.txt"))
        .json(&json!({"code": "x"}))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["code"], "file_type_not_allowed");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn malformed_directive_is_a_bad_request() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;
    let client = reqwest::Client::new();

    client
        .put(format!("http://{addr}/api/files/hello.jac"))
        .json(&json!({"code": "hello"}))
        .send()
        .await
        .expect("put");

    let response = client
        .patch(format!("http://{addr}/api/files/hello.jac"))
        .json(&json!({"command": "not a valid format"}))
        .send()
        .await
        .expect("patch");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["code"], "invalid_directive_format");
    assert_eq!(
        body["message"],
        "Invalid find/replace message format. Expected format: s<delimiter>find<delimiter>replace<delimiter>flags"
    );

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn noop_patch_is_rejected_and_file_untouched() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;
    let client = reqwest::Client::new();

    client
        .put(format!("http://{addr}/api/files/hello.jac"))
        .json(&json!({"code": "hello world"}))
        .send()
        .await
        .expect("put");

    let response = client
        .patch(format!("http://{addr}/api/files/hello.jac"))
        .json(&json!({"command": "s/zzz/x/g"}))
        .send()
        .await
        .expect("patch");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["code"], "no_effective_change");

    let response = client
        .get(format!("http://{addr}/api/files/hello.jac"))
        .send()
        .await
        .expect("get");
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["content"], "hello world");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn create_only_policy_returns_conflict() {
    let (addr, _dir, server) = spawn_server(SavePolicy::CreateOnly).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("http://{addr}/api/files/once.py"))
        .json(&json!({"code": "first"}))
        .send()
        .await
        .expect("first put");
    assert_eq!(response.status(), 201);

    let response = client
        .put(format!("http://{addr}/api/files/once.py"))
        .json(&json!({"code": "second"}))
        .send()
        .await
        .expect("second put");
    assert_eq!(response.status(), 409);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["code"], "file_already_exists");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn wrong_payload_shape_is_invalid_input() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("http://{addr}/api/files/hello.py"))
        .json(&json!({"code": 42}))
        .send()
        .await
        .expect("put");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["code"], "invalid_input");

    server.abort();
    let _ = server.await;
}

#[tokio::test]
async fn health_endpoint_answers() {
    let (addr, _dir, server) = spawn_server(SavePolicy::Overwrite).await;

    let response = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .expect("get");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("decode json");
    assert_eq!(body["ok"], true);

    server.abort();
    let _ = server.await;
}
