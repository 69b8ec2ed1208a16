use std::time::Duration;

use publisher_core::{Article, DraftId, MediaId};
use publisher_logging::pipeline_info;
use serde::Serialize;

use crate::fetch::{map_reqwest_error, read_json};
use crate::platform::{MediaEnvelope, PlatformClient};
use crate::CallError;

const DRAFT_ADD_PATH: &str = "/cgi-bin/draft/add";

#[async_trait::async_trait]
pub trait DraftPublisher: Send + Sync {
    async fn create_draft(&self, article: &Article, cover: &MediaId) -> Result<DraftId, CallError>;
}

#[derive(Debug, Serialize)]
struct DraftRequest<'a> {
    articles: [DraftArticle<'a>; 1],
}

#[derive(Debug, Serialize)]
struct DraftArticle<'a> {
    title: &'a str,
    author: &'a str,
    digest: &'a str,
    content: &'a str,
    thumb_media_id: &'a str,
    need_open_comment: u8,
    only_fans_can_comment: u8,
    show_cover_pic: u8,
}

pub struct PlatformDraftPublisher {
    platform: PlatformClient,
    author: String,
    timeout: Duration,
}

impl PlatformDraftPublisher {
    pub fn new(platform: PlatformClient, author: impl Into<String>, timeout: Duration) -> Self {
        Self {
            platform,
            author: author.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl DraftPublisher for PlatformDraftPublisher {
    async fn create_draft(&self, article: &Article, cover: &MediaId) -> Result<DraftId, CallError> {
        let token = self.platform.access_token().await?;
        let request = DraftRequest {
            articles: [DraftArticle {
                title: &article.title,
                author: &self.author,
                digest: article.digest(),
                content: &article.content,
                thumb_media_id: &cover.0,
                need_open_comment: 1,
                only_fans_can_comment: 0,
                show_cover_pic: 1,
            }],
        };

        let response = self
            .platform
            .http()
            .post(self.platform.endpoint(DRAFT_ADD_PATH))
            .query(&[("access_token", token.as_str())])
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: MediaEnvelope = read_json(response).await?;
        match envelope.into_media_id() {
            Ok(id) => {
                pipeline_info!("draft created: {} (media_id={})", article.title, id);
                Ok(DraftId(id))
            }
            Err(err) => {
                self.platform.observe(&err).await;
                Err(err)
            }
        }
    }
}
