use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::{CallError, FailureKind, FetchOutput};

/// Some image hosts refuse requests that do not look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Builds the shared HTTP client; per-call timeouts are set on each request.
pub fn build_client(connect_timeout: Duration) -> Result<reqwest::Client, CallError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|err| CallError::new(FailureKind::Network, err.to_string()))
}

/// Downloads image bytes with a browser-like user agent.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ImageDownloader {
    pub fn new(client: reqwest::Client, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    /// Downloads `url` into memory, enforcing status, content type and size limits.
    pub async fn fetch(&self, url: &str) -> Result<FetchOutput, CallError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| CallError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(CallError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !is_image_content_type(ct) {
                return Err(CallError::new(
                    FailureKind::MalformedResponse,
                    format!("unexpected content type {ct}"),
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut total = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            total += chunk.len() as u64;
            if total > self.settings.max_bytes {
                return Err(CallError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(total),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(CallError::new(FailureKind::MalformedResponse, "empty image body"));
        }
        Ok(FetchOutput {
            bytes,
            content_type,
            final_url,
        })
    }
}

/// Octet streams are accepted too; several CDNs serve images that way.
fn is_image_content_type(content_type: &str) -> bool {
    let ct = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    ct.starts_with("image/") || ct == "application/octet-stream"
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> CallError {
    if err.is_timeout() {
        return CallError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return CallError::new(FailureKind::MalformedResponse, err.to_string());
    }
    CallError::new(FailureKind::Network, err.to_string())
}

/// Checks the status and decodes a JSON body; any shape mismatch is `MalformedResponse`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CallError> {
    let status = response.status();
    let body = response.text().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(CallError::new(
            FailureKind::HttpStatus(status.as_u16()),
            truncate_for_log(&body),
        ));
    }
    serde_json::from_str(&body)
        .map_err(|err| CallError::new(FailureKind::MalformedResponse, err.to_string()))
}

pub(crate) fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
