use std::process::Output;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MKPRO: &str = env!("CARGO_BIN_EXE_mkpro");

/// Run the binary from an empty directory so no local config or `.env` leaks in.
async fn run_mkpro(args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let workdir = TempDir::new().unwrap();
    let mut cmd = tokio::process::Command::new(MKPRO);
    cmd.args(args)
        .current_dir(workdir.path())
        .env_remove("MKPRO_BRAND")
        .env_remove("MKPRO_API_BASE_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().await.expect("Failed to execute mkpro")
}

async fn run_against(server: &MockServer, args: &[&str]) -> Output {
    run_mkpro(args, &[("MKPRO_API_BASE", &server.uri())]).await
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn mount_brands(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "name": "Cafe Sol", "tone": "cercano"},
            {"id": 9, "name": "Taller Luna"}
        ])))
        .mount(server)
        .await;
}

mod version_command_tests {
    use super::*;

    #[tokio::test]
    async fn test_version_command_basic() {
        let output = run_mkpro(&["version"], &[]).await;
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("mkpro"), "output should contain 'mkpro'");
        assert!(
            stdout.contains(env!("CARGO_PKG_VERSION")),
            "output should contain version number"
        );
    }

    #[tokio::test]
    async fn test_version_command_detailed() {
        let output = run_mkpro(&["version", "--detailed"], &[]).await;
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version --detailed should succeed");
        assert!(stdout.contains("Version"));
        assert!(stdout.contains("Apache-2.0"));
        assert!(stdout.contains("WhatsApp inbox"));
    }

    #[tokio::test]
    async fn test_version_ignores_invalid_config() {
        let output = run_mkpro(&["version"], &[("MKPRO_API_BASE", "ftp://nowhere")]).await;
        assert!(output.status.success());
    }
}

mod help_tests {
    use super::*;

    #[tokio::test]
    async fn test_help_lists_commands() {
        let output = run_mkpro(&["--help"], &[]).await;
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        for command in ["health", "brands", "chat", "wa", "ds", "inbox", "leads", "social"] {
            assert!(stdout.contains(command), "help should mention '{}'", command);
        }
    }

    #[tokio::test]
    async fn test_wa_help_lists_subcommands() {
        let output = run_mkpro(&["wa", "--help"], &[]).await;
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("watch"));
        assert!(stdout.contains("rotate"));
        assert!(stdout.contains("sync-pull"));
    }

    #[tokio::test]
    async fn test_unknown_command_fails() {
        let output = run_mkpro(&["launch-rockets"], &[]).await;
        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("unrecognized subcommand"));
    }
}

mod error_display_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_base_url_shows_config_code() {
        let output = run_mkpro(&["health"], &[("MKPRO_API_BASE", "ftp://nowhere")]).await;
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("[E2002]"), "stderr was: {}", stderr);
        assert!(stderr.contains("api.base_url"));
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_backend() {
        let output = run_mkpro(&["health"], &[("MKPRO_API_BASE", "http://127.0.0.1:9")]).await;

        assert!(!output.status.success());
        assert!(output_to_string(&output).contains("API down"));
        assert!(stderr_to_string(&output).contains("not answering"));
    }
}

mod backend_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let output = run_against(&server, &["health"]).await;
        assert!(output.status.success());
        assert!(output_to_string(&output).contains("API OK"));
    }

    #[tokio::test]
    async fn test_brands_list_table() {
        let server = MockServer::start().await;
        mount_brands(&server).await;

        let output = run_against(&server, &["brands", "list"]).await;
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "{}", stderr_to_string(&output));
        assert!(stdout.contains("Cafe Sol"));
        assert!(stdout.contains("Taller Luna"));
    }

    #[tokio::test]
    async fn test_brands_list_json() {
        let server = MockServer::start().await;
        mount_brands(&server).await;

        let output = run_against(&server, &["--json", "brands"]).await;
        assert!(output.status.success());

        let brands: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(brands.as_array().map(|a| a.len()), Some(2));
        assert_eq!(brands[0]["name"], "Cafe Sol");
    }

    #[tokio::test]
    async fn test_leads_default_to_first_brand() {
        let server = MockServer::start().await;
        mount_brands(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/leads"))
            .and(query_param("brand_id", "4"))
            .and(query_param("page", "1"))
            .and(query_param("page_size", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": 1, "name": "Carla", "channel": "web", "score": 82}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = run_against(&server, &["leads", "list", "--page-size", "2"]).await;
        assert!(output.status.success(), "{}", stderr_to_string(&output));
        assert!(output_to_string(&output).contains("Carla"));
    }

    #[tokio::test]
    async fn test_backend_error_detail_is_shown() {
        let server = MockServer::start().await;
        mount_brands(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/chat/thread"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "thread not found"})),
            )
            .mount(&server)
            .await;

        let output = run_against(&server, &["--brand", "9", "chat", "thread"]).await;
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("[E1003] thread not found"), "stderr was: {}", stderr);
    }

    #[tokio::test]
    async fn test_ds_delete_requires_confirmation() {
        let server = MockServer::start().await;
        mount_brands(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/wa/datasource/delete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;

        let output = run_against(&server, &["ds", "delete", "12"]).await;
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("[E3001]"), "stderr was: {}", stderr);
        assert!(stderr.contains("--yes"));
    }

    #[tokio::test]
    async fn test_no_brands_explains_how_to_create_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/brands"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let output = run_against(&server, &["inbox"]).await;
        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("mkpro brands create"));
    }
}
