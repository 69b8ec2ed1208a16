use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use publisher_core::ImageReference;
use publisher_engine::{
    extract_image_url, ArticleGenerator, ChatArticleGenerator, Clock, FailureKind,
    ImageGenerator, MultimodalImageGenerator, PlaceholderImageService, PlaceholderSource,
    RawImageResponse,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn chat_generator(server: &MockServer) -> ChatArticleGenerator {
    ChatArticleGenerator::new(
        reqwest::Client::new(),
        format!("{}/compatible-mode/v1", server.uri()),
        Some("sk-test".to_string()),
        "qwen-plus",
        TIMEOUT,
    )
}

fn fixed_clock() -> Clock {
    Arc::new(|| Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
}

#[tokio::test]
async fn chat_completion_is_parsed_into_article() {
    let server = MockServer::start().await;
    let reply = json!({
        "title": "用例生成新范式",
        "content": "# 引言\n\n正文段落",
        "summary": "摘要",
        "image_prompt": "robot testing software"
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/compatible-mode/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "qwen-plus",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": reply}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let article = chat_generator(&server).generate("大模型测试").await;
    assert_eq!(article.title, "用例生成新范式");
    assert_eq!(article.content, "<h2>引言</h2>\n<p>正文段落</p>");
    assert_eq!(article.summary, "摘要");
    assert_eq!(article.image_prompt, "robot testing software");
}

#[tokio::test]
async fn server_error_yields_fallback_article() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let article = chat_generator(&server).generate("大模型测试").await;
    assert_eq!(article.title, "今日AI测试洞察：大模型测试");
    assert!(!article.content.is_empty());
}

#[tokio::test]
async fn non_json_reply_yields_fallback_article() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Sorry, I cannot help with that."}}]
        })))
        .mount(&server)
        .await;

    let article = chat_generator(&server).generate("接口测试").await;
    assert_eq!(article.title, "今日AI测试洞察：接口测试");
}

#[tokio::test]
async fn missing_api_key_yields_fallback_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let generator = ChatArticleGenerator::new(
        reqwest::Client::new(),
        server.uri(),
        None,
        "qwen-plus",
        TIMEOUT,
    );
    let article = generator.generate("性能测试").await;
    assert_eq!(article.title, "今日AI测试洞察：性能测试");
}

#[tokio::test]
async fn image_generation_returns_extractable_response() {
    let server = MockServer::start().await;
    let image_url = "https://cdn.example.com/generated/1.png";
    Mock::given(method("POST"))
        .and(path("/api/v1/services/aigc/multimodal-generation/generation"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "qwen-image-plus",
            "input": {"messages": [{"role": "user", "content": [{"text": "blue robots"}]}]},
            "parameters": {"size": "1024*1024"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"choices": [{"message": {"content": [{"image": image_url}]}}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = MultimodalImageGenerator::new(
        reqwest::Client::new(),
        format!("{}/api/v1/services/aigc/multimodal-generation/generation", server.uri()),
        Some("sk-test".to_string()),
        "qwen-image-plus",
        TIMEOUT,
    );
    let raw = generator.generate("blue robots").await.expect("image response");
    assert_eq!(extract_image_url(&raw).as_deref(), Some(image_url));
}

#[tokio::test]
async fn image_generation_http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("throttled"))
        .mount(&server)
        .await;

    let generator = MultimodalImageGenerator::new(
        reqwest::Client::new(),
        server.uri(),
        Some("sk-test".to_string()),
        "qwen-image-plus",
        TIMEOUT,
    );
    let err = generator.generate("x").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(429));
}

#[tokio::test]
async fn plain_text_image_body_is_kept_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://cdn.example.com/a.png"))
        .mount(&server)
        .await;

    let generator = MultimodalImageGenerator::new(
        reqwest::Client::new(),
        server.uri(),
        Some("sk-test".to_string()),
        "qwen-image-plus",
        TIMEOUT,
    );
    let raw = generator.generate("x").await.unwrap();
    assert_eq!(
        extract_image_url(&raw).as_deref(),
        Some("https://cdn.example.com/a.png")
    );
    assert!(matches!(raw, RawImageResponse::Text(_)));
}

#[tokio::test]
async fn placeholder_accepted_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path_regex(r"^/placeholder/900/500$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/placeholder", server.uri());
    let service = PlaceholderImageService::new(reqwest::Client::new(), &base, TIMEOUT, fixed_clock());
    let reference = service.acquire().await.expect("placeholder");
    assert_eq!(
        reference,
        ImageReference::Remote(format!("{base}/900/500?random=1767323045000"))
    );
}

#[tokio::test]
async fn placeholder_rejected_on_non_200() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service =
        PlaceholderImageService::new(reqwest::Client::new(), server.uri(), TIMEOUT, fixed_clock());
    let err = service.acquire().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn placeholder_probe_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let service = PlaceholderImageService::new(
        reqwest::Client::new(),
        server.uri(),
        Duration::from_millis(50),
        fixed_clock(),
    );
    let err = service.acquire().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}
