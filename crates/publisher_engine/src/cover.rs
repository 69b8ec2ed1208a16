use std::path::PathBuf;
use std::time::Duration;

use publisher_core::ImageReference;
use publisher_logging::{pipeline_info, pipeline_warn};
use reqwest::StatusCode;

use crate::fetch::{map_reqwest_error, BROWSER_USER_AGENT};
use crate::{CallError, Clock, FailureKind};

pub const PLACEHOLDER_WIDTH: u32 = 900;
pub const PLACEHOLDER_HEIGHT: u32 = 500;

/// Second image tier: a generic placeholder image service.
#[async_trait::async_trait]
pub trait PlaceholderSource: Send + Sync {
    async fn acquire(&self) -> Result<ImageReference, CallError>;
}

pub struct PlaceholderImageService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    clock: Clock,
}

impl PlaceholderImageService {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        timeout: Duration,
        clock: Clock,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
            clock,
        }
    }

    /// `{base}/{width}/{height}?random={millis}`; the timestamp defeats caches.
    pub fn candidate_url(&self) -> String {
        format!(
            "{}/{}/{}?random={}",
            self.base_url.trim_end_matches('/'),
            PLACEHOLDER_WIDTH,
            PLACEHOLDER_HEIGHT,
            (self.clock)().timestamp_millis()
        )
    }
}

#[async_trait::async_trait]
impl PlaceholderSource for PlaceholderImageService {
    async fn acquire(&self) -> Result<ImageReference, CallError> {
        let url = self.candidate_url();
        let response = self
            .client
            .head(&url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status != StatusCode::OK {
            pipeline_warn!("placeholder probe {} returned {}", url, status);
            return Err(CallError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("placeholder probe returned {status}"),
            ));
        }
        pipeline_info!("placeholder image accepted: {}", url);
        Ok(ImageReference::Remote(url))
    }
}

/// Third image tier: the cover image shipped next to the binary.
#[derive(Debug, Clone)]
pub struct LocalCoverImage {
    path: PathBuf,
}

impl LocalCoverImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn locate(&self) -> Result<ImageReference, CallError> {
        if self.path.is_file() {
            Ok(ImageReference::Local(self.path.clone()))
        } else {
            Err(CallError::new(
                FailureKind::MissingResource,
                format!("fallback image {} not found", self.path.display()),
            ))
        }
    }
}
