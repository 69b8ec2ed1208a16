use std::collections::VecDeque;
use std::sync::Arc;

use publisher_core::{
    update, CallError, Effect, FailureKind, ImageTier, Msg, PipelineState, RunOutcome, RunReport,
};
use publisher_logging::{begin_run, pipeline_error, pipeline_info, pipeline_warn};

use crate::archive::LocalDraftArchive;
use crate::article::{ArticleGenerator, ChatArticleGenerator};
use crate::config::PublisherConfig;
use crate::cover::{LocalCoverImage, PlaceholderImageService, PlaceholderSource};
use crate::draft::{DraftPublisher, PlatformDraftPublisher};
use crate::extract::resolve_image_reference;
use crate::fetch::{build_client, FetchSettings, ImageDownloader};
use crate::image::{ImageGenerator, MultimodalImageGenerator};
use crate::media::{MediaUploader, PlatformMediaUploader};
use crate::platform::PlatformClient;
use crate::token::{PlatformTokenSource, TokenCache};
use crate::topic::{RandomTopicSelector, TopicSource};
use crate::types::{system_clock, Clock};

/// Everything the engine talks to while executing effects.
pub struct Collaborators {
    pub topics: Arc<dyn TopicSource>,
    pub articles: Arc<dyn ArticleGenerator>,
    pub images: Arc<dyn ImageGenerator>,
    pub placeholder: Arc<dyn PlaceholderSource>,
    pub local_cover: LocalCoverImage,
    pub uploader: Arc<dyn MediaUploader>,
    pub drafts: Arc<dyn DraftPublisher>,
    pub archive: LocalDraftArchive,
}

impl Collaborators {
    pub fn from_config(config: &PublisherConfig, clock: Clock) -> Result<Self, CallError> {
        let timeouts = &config.timeouts;
        let credentials = &config.credentials;
        let client = build_client(timeouts.connect)?;

        let token_source = PlatformTokenSource::new(
            client.clone(),
            config.endpoints.platform_base_url.clone(),
            credentials.app_id.clone(),
            credentials.app_secret.clone(),
            timeouts.token,
        );
        let tokens = Arc::new(TokenCache::new(Arc::new(token_source), clock.clone()));
        let platform = PlatformClient::new(
            client.clone(),
            config.endpoints.platform_base_url.clone(),
            tokens,
        );
        let downloader = ImageDownloader::new(
            client.clone(),
            FetchSettings {
                request_timeout: timeouts.download,
                max_bytes: config.max_image_bytes,
            },
        );

        Ok(Self {
            topics: Arc::new(RandomTopicSelector),
            articles: Arc::new(ChatArticleGenerator::new(
                client.clone(),
                config.endpoints.llm_base_url.clone(),
                credentials.model_api_key.clone(),
                config.chat_model.clone(),
                timeouts.article,
            )),
            images: Arc::new(MultimodalImageGenerator::new(
                client.clone(),
                config.endpoints.image_api_url.clone(),
                credentials.model_api_key.clone(),
                config.image_model.clone(),
                timeouts.image,
            )),
            placeholder: Arc::new(PlaceholderImageService::new(
                client,
                config.endpoints.placeholder_base_url.clone(),
                timeouts.probe,
                clock.clone(),
            )),
            local_cover: LocalCoverImage::new(config.fallback_image.clone()),
            uploader: Arc::new(PlatformMediaUploader::new(
                platform.clone(),
                downloader,
                timeouts.upload,
            )),
            drafts: Arc::new(PlatformDraftPublisher::new(
                platform,
                config.author.clone(),
                timeouts.draft,
            )),
            archive: LocalDraftArchive::new(config.drafts_dir.clone(), clock),
        })
    }
}

/// Drives the pure pipeline state machine, executing its effects one at a time.
///
/// Runs are sequential: callers must not start a second run on the same
/// engine while one is in flight.
pub struct PublishEngine {
    parts: Collaborators,
}

impl PublishEngine {
    pub fn new(parts: Collaborators) -> Self {
        Self { parts }
    }

    pub fn from_config(config: &PublisherConfig) -> Result<Self, CallError> {
        Ok(Self::new(Collaborators::from_config(config, system_clock())?))
    }

    /// Replaces the topic selector (e.g. with a fixed topic).
    pub fn with_topics(mut self, topics: Arc<dyn TopicSource>) -> Self {
        self.parts.topics = topics;
        self
    }

    pub async fn run(&self) -> RunReport {
        let run_id = begin_run();
        pipeline_info!("pipeline run {} started", run_id);

        let mut pending = VecDeque::new();
        let (mut state, effects) = update(PipelineState::new(), Msg::Start);
        pending.extend(effects);

        while let Some(effect) = pending.pop_front() {
            let Some(msg) = self.handle_effect(effect).await else {
                continue;
            };
            let before = state.stage();
            let (next, effects) = update(state, msg);
            state = next;
            if state.stage() != before {
                pipeline_info!("stage {:?} -> {:?}", before, state.stage());
            }
            pending.extend(effects);
        }

        state.report()
    }

    async fn handle_effect(&self, effect: Effect) -> Option<Msg> {
        let parts = &self.parts;
        let msg = match effect {
            Effect::SelectTopic => {
                let topic = parts.topics.topic();
                pipeline_info!("topic of the day: {}", topic);
                Msg::TopicSelected(topic)
            }
            Effect::GenerateArticle { topic } => {
                Msg::ArticleReady(parts.articles.generate(&topic).await)
            }
            Effect::GenerateImage { prompt } => {
                let result = parts
                    .images
                    .generate(&prompt)
                    .await
                    .and_then(|raw| resolve_image_reference(&raw));
                image_resolved(ImageTier::Generated, result)
            }
            Effect::ProbePlaceholder => {
                image_resolved(ImageTier::Placeholder, parts.placeholder.acquire().await)
            }
            Effect::LocateFallbackImage => {
                image_resolved(ImageTier::LocalFile, parts.local_cover.locate())
            }
            Effect::UploadMedia { reference } => {
                let result = parts.uploader.upload(&reference).await;
                if let Err(err) = &result {
                    pipeline_error!("cover upload failed: {}", err);
                }
                Msg::MediaUploaded(result)
            }
            Effect::CreateDraft { article, media_id } => {
                let result = parts.drafts.create_draft(&article, &media_id).await;
                if let Err(err) = &result {
                    pipeline_error!("draft creation failed: {}", err);
                }
                Msg::DraftCreated(result)
            }
            Effect::ArchiveDraft {
                article,
                image,
                reason,
            } => {
                let result = parts
                    .archive
                    .archive(&article, image.as_ref(), &reason)
                    .map_err(|err| CallError::new(FailureKind::Io, err.to_string()));
                Msg::DraftArchived(result)
            }
            Effect::Finish(outcome) => {
                log_outcome(&outcome);
                return None;
            }
        };
        Some(msg)
    }
}

fn image_resolved(
    tier: ImageTier,
    result: Result<publisher_core::ImageReference, CallError>,
) -> Msg {
    match &result {
        Ok(reference) => pipeline_info!("cover image from {} tier: {}", tier, reference),
        Err(err) => pipeline_warn!("{} image tier failed: {}", tier, err),
    }
    Msg::ImageResolved { tier, result }
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Published { draft_id } => {
            pipeline_info!("run finished: draft {} saved", draft_id)
        }
        RunOutcome::ArchivedLocally { path, reason } => pipeline_error!(
            "run failed ({}); article archived at {:?}",
            reason,
            path
        ),
        RunOutcome::Failed { stage, reason } => {
            pipeline_error!("run failed at {:?}: {}", stage, reason)
        }
    }
}
