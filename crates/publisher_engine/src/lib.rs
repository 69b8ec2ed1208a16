//! Publisher engine: external calls, local persistence and effect execution.
mod archive;
mod article;
mod config;
mod convert;
mod cover;
mod draft;
mod engine;
mod extract;
mod fetch;
mod filename;
mod frontmatter;
mod image;
mod media;
mod persist;
mod platform;
mod token;
mod topic;
mod types;

pub use archive::LocalDraftArchive;
pub use article::{fallback_article, format_content, parse_article, ArticleGenerator, ChatArticleGenerator};
pub use config::{
    parse_publish_time, ConfigError, Credentials, Endpoints, PublisherConfig, Timeouts,
};
pub use convert::{Converter, Html2MdConverter};
pub use cover::{LocalCoverImage, PlaceholderImageService, PlaceholderSource};
pub use draft::{DraftPublisher, PlatformDraftPublisher};
pub use engine::{Collaborators, PublishEngine};
pub use extract::{extract_image_url, resolve_image_reference};
pub use fetch::{build_client, FetchSettings, ImageDownloader, BROWSER_USER_AGENT};
pub use filename::archive_filename;
pub use frontmatter::build_archive_document;
pub use image::{ImageGenerator, MultimodalImageGenerator};
pub use media::{MediaUploader, PlatformMediaUploader};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use platform::PlatformClient;
pub use token::{AccessToken, PlatformTokenSource, TokenCache, TokenGrant, TokenSource, EXPIRY_MARGIN_SECS};
pub use topic::{FixedTopic, RandomTopicSelector, TopicSource};
pub use types::{system_clock, CallError, Clock, FailureKind, FetchOutput, RawImageResponse};
