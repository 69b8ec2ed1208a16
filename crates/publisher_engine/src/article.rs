use std::time::Duration;

use publisher_core::{Article, DEFAULT_IMAGE_PROMPT, DEFAULT_SUBJECT};
use publisher_logging::{pipeline_info, pipeline_warn};
use serde::{Deserialize, Serialize};

use crate::fetch::{map_reqwest_error, read_json};
use crate::{CallError, FailureKind};

const SYSTEM_PROMPT: &str = "你是一位专业的AI软件测试领域专家，负责为「啄木鸟软件测试」公众号撰写高质量技术文章。

文章要求：
1. 标题：吸引人、包含关键词、20字以内
2. 内容：2000字左右，结构清晰，包含引言、2-4个小标题段落、结语
3. 风格：专业但不晦涩，有洞察力和前瞻性，可引用真实案例
4. 配图提示词：为文章配图生成英文提示词，用于文生图模型
5. 输出格式：严格按照JSON格式返回，字段为 title、content、summary、image_prompt
";

const TEMPERATURE: f32 = 0.8;

/// Produces today's article. Implementations never fail: on any error they
/// return a canned article so the pipeline can proceed.
#[async_trait::async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> Article;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ArticlePayload {
    title: Option<String>,
    content: Option<String>,
    summary: Option<String>,
    image_prompt: Option<String>,
}

/// Article generator backed by an OpenAI-compatible chat completion endpoint.
pub struct ChatArticleGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for ChatArticleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatArticleGenerator")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

impl ChatArticleGenerator {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            timeout,
        }
    }

    async fn request_article(&self, subject: &str) -> Result<Article, CallError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CallError::new(FailureKind::MissingCredentials, "DASHSCOPE_API_KEY not configured")
        })?;
        let user_prompt = format!("请撰写一篇关于「{subject}」的技术文章");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let completion: ChatResponse = read_json(response).await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CallError::new(FailureKind::MissingField("choices"), "completion without content")
            })?;
        parse_article(&content)
    }
}

#[async_trait::async_trait]
impl ArticleGenerator for ChatArticleGenerator {
    async fn generate(&self, topic: &str) -> Article {
        let subject = subject_for(topic);
        match self.request_article(subject).await {
            Ok(article) => {
                pipeline_info!("article generated: {}", article.title);
                article
            }
            Err(err) => {
                pipeline_warn!("article generation failed ({}); using fallback article", err);
                fallback_article(topic)
            }
        }
    }
}

fn subject_for(topic: &str) -> &str {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        DEFAULT_SUBJECT
    } else {
        trimmed
    }
}

/// Parses the model's JSON reply. Title and content are required and must be non-blank.
pub fn parse_article(raw: &str) -> Result<Article, CallError> {
    let payload: ArticlePayload = serde_json::from_str(raw.trim())
        .map_err(|err| CallError::new(FailureKind::MalformedResponse, err.to_string()))?;
    let title = non_blank(payload.title)
        .ok_or_else(|| CallError::new(FailureKind::MissingField("title"), ""))?;
    let body = non_blank(payload.content)
        .ok_or_else(|| CallError::new(FailureKind::MissingField("content"), ""))?;
    Ok(Article {
        title,
        content: format_content(&body),
        summary: payload.summary.unwrap_or_default().trim().to_string(),
        image_prompt: non_blank(payload.image_prompt)
            .unwrap_or_else(|| DEFAULT_IMAGE_PROMPT.to_string()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turns blank-line separated text into `<h2>`/`<h3>`/`<p>` blocks.
///
/// `# ` lines become `<h2>`, `## ` lines `<h3>`. Text that already starts with
/// a tag is returned unchanged.
pub fn format_content(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('<') {
        return trimmed.to_string();
    }
    trimmed
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            if let Some(heading) = block.strip_prefix("## ") {
                format!("<h3>{}</h3>", heading.trim())
            } else if let Some(heading) = block.strip_prefix("# ") {
                format!("<h2>{}</h2>", heading.trim())
            } else {
                format!("<p>{block}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canned article used whenever generation fails.
pub fn fallback_article(topic: &str) -> Article {
    Article {
        title: format!("今日AI测试洞察：{}", subject_for(topic)),
        content: "<p>内容生成服务暂时不可用，请稍后查看。</p>".to_string(),
        summary: "内容生成服务暂时不可用".to_string(),
        image_prompt: "AI software testing, futuristic, blue tone".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_headings_and_paragraphs() {
        let text = "# 引言\n\n第一段\n第一段续\n\n## 小标题\n\n\n\n结语";
        assert_eq!(
            format_content(text),
            "<h2>引言</h2>\n<p>第一段\n第一段续</p>\n<h3>小标题</h3>\n<p>结语</p>"
        );
    }

    #[test]
    fn markup_is_left_alone() {
        let html = "<h2>Intro</h2><p>x</p>";
        assert_eq!(format_content(html), html);
    }

    #[test]
    fn fallback_embeds_topic_or_default() {
        assert_eq!(fallback_article("大模型测试").title, "今日AI测试洞察：大模型测试");
        assert_eq!(fallback_article("  ").title, "今日AI测试洞察：AI软件测试");
    }

    #[test]
    fn parse_requires_title_and_content() {
        let ok = parse_article(r##"{"title":"T","content":"# H\n\nbody","summary":"S"}"##).unwrap();
        assert_eq!(ok.title, "T");
        assert_eq!(ok.content, "<h2>H</h2>\n<p>body</p>");
        assert_eq!(ok.image_prompt, DEFAULT_IMAGE_PROMPT);

        let err = parse_article(r#"{"content":"body"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingField("title"));
        let err = parse_article(r#"{"title":" ","content":"body"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingField("title"));
        let err = parse_article(r#"{"title":"T"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingField("content"));
        let err = parse_article("not json").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
        let err = parse_article("").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
    }
}
