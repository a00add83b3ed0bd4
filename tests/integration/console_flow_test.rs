//! End-to-end flows: the `mkpro` binary against a mocked backend.

use std::process::Output;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MKPRO: &str = env!("CARGO_BIN_EXE_mkpro");

async fn run_against(server: &MockServer, args: &[&str]) -> Output {
    let workdir = TempDir::new().unwrap();
    tokio::process::Command::new(MKPRO)
        .args(args)
        .current_dir(workdir.path())
        .env_remove("MKPRO_BRAND")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("MKPRO_API_BASE", server.uri())
        .env("MKPRO_POLLING__INTERVAL_MS", "50")
        .env("MKPRO_POLLING__MAX_TICKS", "20")
        .output()
        .await
        .expect("Failed to execute mkpro")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn mount_brands(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "name": "Cafe Sol"}
        ])))
        .mount(server)
        .await;
}

async fn mount_tag_board(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/wa/board"))
        .and(query_param("brand_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "group_by": "tag",
            "columns": [
                {"key": "vip", "title": "vip", "cards": [
                    {"jid": "34600111222@s.whatsapp.net", "name": "Ana", "tags": ["vip"], "priority": 1}
                ]},
                {"key": "untagged", "title": "Sin tag", "cards": []}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_wa_watch_until_connected() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wa/start"))
        .and(query_param("brand_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wa/qr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connected": false,
            "pairingCode": "WXYZ-1234"
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wa/qr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"connected": true})))
        .mount(&server)
        .await;

    let output = run_against(&server, &["wa", "watch"]).await;
    let out = stdout(&output);

    assert!(output.status.success(), "stderr was: {}", stderr(&output));
    assert!(out.contains("WXYZ-1234"));
    assert!(out.contains("connected"));
}

#[tokio::test]
async fn test_wa_watch_json_reports_exhausted_polling() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wa/start"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "instance already exists"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wa/qr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"connected": false})))
        .mount(&server)
        .await;

    let workdir = TempDir::new().unwrap();
    let output = tokio::process::Command::new(MKPRO)
        .args(["--json", "wa", "watch"])
        .current_dir(workdir.path())
        .env_remove("MKPRO_BRAND")
        .env("MKPRO_API_BASE", server.uri())
        .env("MKPRO_POLLING__INTERVAL_MS", "20")
        .env("MKPRO_POLLING__MAX_TICKS", "3")
        .output()
        .await
        .unwrap();

    assert!(!output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["connected"], false);
    assert_eq!(report["outcome"], "gave up after 3 polls");
}

#[tokio::test]
async fn test_inbox_move_appends_tag() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    mount_tag_board(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wa/chat/meta"))
        .and(body_json(json!({
            "brand_id": 4,
            "jid": "34600111222@s.whatsapp.net",
            "tags": ["vip", "promo"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &[
            "inbox",
            "move",
            "34600111222@s.whatsapp.net",
            "promo",
            "--group-by",
            "tag",
        ],
    )
    .await;

    assert!(output.status.success(), "stderr was: {}", stderr(&output));
    assert!(stdout(&output).contains("Moved"));
}

#[tokio::test]
async fn test_inbox_meta_keeps_unset_fields() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    mount_tag_board(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wa/chat/meta"))
        .and(body_partial_json(json!({
            "jid": "34600111222@s.whatsapp.net",
            "priority": 1,
            "pinned": true,
            "tags": ["vip", "promo"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &[
            "inbox",
            "meta",
            "34600111222@s.whatsapp.net",
            "--pinned",
            "true",
            "--tags",
            "vip, promo, vip",
        ],
    )
    .await;

    assert!(output.status.success(), "stderr was: {}", stderr(&output));
}

#[tokio::test]
async fn test_save_config_falls_back_and_keeps_loaded_values() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/wa/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": {"agent_mode": "ventas", "super_keyword": "#jefe"},
            "datasources": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/wa/config"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/wa/config/set"))
        .and(body_partial_json(json!({
            "brand_id": 4,
            "agent_mode": "reservas",
            "temperature": 0.5,
            "super_keyword": "#jefe"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &["wa", "save-config", "--mode", "reservas", "--temperature", "0.5"],
    )
    .await;

    assert!(output.status.success(), "stderr was: {}", stderr(&output));
    assert!(stdout(&output).contains("Configuration saved"));
}

#[tokio::test]
async fn test_chat_send_shows_orchestrator_reply() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({"brand_id": 4, "agent": "mc", "text": "plan de octubre"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread_id": 11,
            "messages": [{"sender": "user", "text": "plan de octubre"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/agent/mc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread_id": 11,
            "messages": [
                {"sender": "user", "text": "plan de octubre"},
                {"sender": "agent", "agent": "mc", "text": "Propongo tres posts"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["chat", "send", "plan de octubre"]).await;
    let out = stdout(&output);

    assert!(output.status.success(), "stderr was: {}", stderr(&output));
    assert!(out.contains("Propongo tres posts"));
    assert!(out.contains("agent (mc)"));
}

#[tokio::test]
async fn test_ds_upsert_sends_draft() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wa/datasource/upsert"))
        .and(body_partial_json(json!({
            "brand_id": 4,
            "name": "Stock",
            "kind": "http",
            "url": "https://stock.example",
            "headers": {"X-Key": "abc"},
            "enabled": true,
            "read_only": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wa/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": {},
            "datasources": [{"id": 3, "name": "Stock", "kind": "http", "url": "https://stock.example"}]
        })))
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &[
            "ds",
            "upsert",
            "--name",
            "Stock",
            "--kind",
            "http",
            "--url",
            "https://stock.example",
            "--headers",
            r#"{"X-Key": "abc"}"#,
        ],
    )
    .await;

    assert!(output.status.success(), "stderr was: {}", stderr(&output));
    assert!(stdout(&output).contains("Datasource 'Stock' saved"));
}

#[tokio::test]
async fn test_ds_upsert_rejects_bad_headers_without_request() {
    let server = MockServer::start().await;
    mount_brands(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/wa/datasource/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &["ds", "upsert", "--name", "Stock", "--url", "x", "--headers", "not json"],
    )
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("headers must be a JSON object"));
}
