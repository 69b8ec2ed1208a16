use std::time::Duration;

use publisher_logging::{pipeline_debug, pipeline_warn};
use serde::Serialize;

use crate::fetch::{map_reqwest_error, truncate_for_log};
use crate::{CallError, FailureKind, RawImageResponse};

const NEGATIVE_PROMPT: &str = "text, watermark, signature, low quality, blurry";
const OUTPUT_SIZE: &str = "1024*1024";

/// Text-to-image call. Returns the provider's raw response; no retries.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<RawImageResponse, CallError>;
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct ImageInput<'a> {
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct ImageParameters {
    negative_prompt: &'static str,
    prompt_extend: bool,
    size: &'static str,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    input: ImageInput<'a>,
    parameters: ImageParameters,
}

pub struct MultimodalImageGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl MultimodalImageGenerator {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ImageGenerator for MultimodalImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<RawImageResponse, CallError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CallError::new(FailureKind::MissingCredentials, "DASHSCOPE_API_KEY not configured")
        })?;
        let request = ImageRequest {
            model: &self.model,
            input: ImageInput {
                messages: [UserMessage {
                    role: "user",
                    content: [TextPart { text: prompt }],
                }],
            },
            parameters: ImageParameters {
                negative_prompt: NEGATIVE_PROMPT,
                prompt_extend: true,
                size: OUTPUT_SIZE,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            pipeline_warn!("image generation returned {}: {}", status, truncate_for_log(&body));
            return Err(CallError::new(
                FailureKind::HttpStatus(status.as_u16()),
                truncate_for_log(&body),
            ));
        }
        if body.trim().is_empty() {
            return Err(CallError::new(FailureKind::MalformedResponse, "empty body"));
        }
        pipeline_debug!("image generation response: {}", truncate_for_log(&body));
        Ok(RawImageResponse::from_body(&body))
    }
}
