use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use publisher_core::{ImageTier, RunOutcome, Stage};
use publisher_engine::{
    Credentials, Endpoints, FixedTopic, PublishEngine, PublisherConfig, Timeouts,
};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC: &str = "大模型测试";

fn config(server: &MockServer, workdir: &Path) -> PublisherConfig {
    PublisherConfig {
        endpoints: Endpoints::all_at(&server.uri()),
        credentials: Credentials {
            model_api_key: Some("sk-test".to_string()),
            app_id: Some("app-id".to_string()),
            app_secret: Some("app-secret".to_string()),
        },
        fallback_image: workdir.join("assets/missing_cover.png"),
        drafts_dir: workdir.join("drafts"),
        timeouts: Timeouts {
            probe: Duration::from_millis(200),
            ..Timeouts::default()
        },
        ..PublisherConfig::default()
    }
}

fn engine(config: &PublisherConfig) -> PublishEngine {
    PublishEngine::from_config(config)
        .expect("engine")
        .with_topics(Arc::new(FixedTopic(TOPIC.to_string())))
}

async fn mount_failing_model_apis(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/compatible-mode/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/multimodal-generation/generation"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

async fn mount_placeholder(server: &MockServer) {
    Mock::given(method("HEAD"))
        .and(path_regex(r"^/placeholder/900/500$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/placeholder/900/500$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"\x89PNG-cover".to_vec(), "image/png"))
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "TOKEN", "expires_in": 7200})),
        )
        .mount(server)
        .await;
}

fn archived_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn placeholder_cover_still_publishes_draft() {
    let server = MockServer::start().await;
    let workdir = tempfile::tempdir().unwrap();
    mount_failing_model_apis(&server).await;
    mount_placeholder(&server).await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"media_id": "MEDIA123"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/draft/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"media_id": "DRAFT42"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server, workdir.path());
    let report = engine(&config).run().await;

    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.title.as_deref(), Some("今日AI测试洞察：大模型测试"));
    assert_eq!(report.image_tier, Some(ImageTier::Placeholder));
    assert_eq!(report.media_id.as_ref().map(|id| id.0.as_str()), Some("MEDIA123"));
    assert!(matches!(
        report.outcome,
        Some(RunOutcome::Published { ref draft_id }) if draft_id.0 == "DRAFT42"
    ));
    assert!(archived_files(&config.drafts_dir).is_empty());
}

#[tokio::test]
async fn exhausted_image_tiers_fail_without_upload() {
    let server = MockServer::start().await;
    let workdir = tempfile::tempdir().unwrap();
    mount_failing_model_apis(&server).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;
    Mock::given(path_regex(r"^/cgi-bin/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = config(&server, workdir.path());
    let report = engine(&config).run().await;

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.stage, Stage::Failed);
    assert_eq!(
        report.attempted_tiers(),
        vec![ImageTier::Generated, ImageTier::Placeholder, ImageTier::LocalFile]
    );
    assert!(!report.reached(Stage::UploadMedia));
    assert!(archived_files(&config.drafts_dir).is_empty());
}

#[tokio::test]
async fn upload_failure_archives_article_locally() {
    let server = MockServer::start().await;
    let workdir = tempfile::tempdir().unwrap();
    mount_failing_model_apis(&server).await;
    mount_placeholder(&server).await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/media/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 40004, "errmsg": "invalid media type"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/draft/add"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config(&server, workdir.path());
    let report = engine(&config).run().await;

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.stage, Stage::ArchivedLocallyFailed);
    let files = archived_files(&config.drafts_dir);
    assert_eq!(files.len(), 1);
    let document = std::fs::read_to_string(&files[0]).unwrap();
    assert!(document.contains("今日AI测试洞察：大模型测试"));
    assert!(document.contains("内容生成服务暂时不可用"));
    assert!(matches!(
        report.outcome,
        Some(RunOutcome::ArchivedLocally { ref path, .. }) if path == &files[0]
    ));
}
