use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

pub const DEFAULT_LLM_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_IMAGE_API_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";
pub const DEFAULT_PLATFORM_BASE_URL: &str = "https://api.weixin.qq.com";
pub const DEFAULT_PLACEHOLDER_BASE_URL: &str = "https://picsum.photos";
pub const DEFAULT_CHAT_MODEL: &str = "qwen-plus";
pub const DEFAULT_IMAGE_MODEL: &str = "qwen-image-plus";
pub const DEFAULT_AUTHOR: &str = "AI测试助手";
pub const DEFAULT_FALLBACK_IMAGE: &str = "assets/default_cover.png";
pub const DEFAULT_DRAFTS_DIR: &str = "drafts";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// OpenAI-compatible base; `/chat/completions` is appended.
    pub llm_base_url: String,
    pub image_api_url: String,
    pub platform_base_url: String,
    pub placeholder_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            image_api_url: DEFAULT_IMAGE_API_URL.to_string(),
            platform_base_url: DEFAULT_PLATFORM_BASE_URL.to_string(),
            placeholder_base_url: DEFAULT_PLACEHOLDER_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint rooted at one base url; used to point the engine at a mock server.
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            llm_base_url: format!("{base}/compatible-mode/v1"),
            image_api_url: format!("{base}/api/v1/services/aigc/multimodal-generation/generation"),
            platform_base_url: base.to_string(),
            placeholder_base_url: format!("{base}/placeholder"),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub model_api_key: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("model_api_key", &redact(&self.model_api_key))
            .field("app_id", &self.app_id)
            .field("app_secret", &redact(&self.app_secret))
            .finish()
    }
}

impl Credentials {
    pub fn has_model_api(&self) -> bool {
        self.model_api_key.is_some()
    }

    pub fn has_platform(&self) -> bool {
        self.app_id.is_some() && self.app_secret.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub article: Duration,
    pub image: Duration,
    pub probe: Duration,
    pub token: Duration,
    pub download: Duration,
    pub upload: Duration,
    pub draft: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            article: Duration::from_secs(60),
            image: Duration::from_secs(60),
            probe: Duration::from_secs(10),
            token: Duration::from_secs(10),
            download: Duration::from_secs(30),
            upload: Duration::from_secs(30),
            draft: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    pub endpoints: Endpoints,
    pub credentials: Credentials,
    pub chat_model: String,
    pub image_model: String,
    pub author: String,
    pub fallback_image: PathBuf,
    pub drafts_dir: PathBuf,
    pub publish_time: NaiveTime,
    pub save_to_draft: bool,
    pub timeouts: Timeouts,
    /// Upper bound for downloaded cover images.
    pub max_image_bytes: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            credentials: Credentials::default(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            fallback_image: PathBuf::from(DEFAULT_FALLBACK_IMAGE),
            drafts_dir: PathBuf::from(DEFAULT_DRAFTS_DIR),
            publish_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            save_to_draft: true,
            timeouts: Timeouts::default(),
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

impl PublisherConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let endpoints = Endpoints {
            llm_base_url: get("LLM_BASE_URL").unwrap_or(defaults.endpoints.llm_base_url),
            image_api_url: get("IMAGE_API_URL").unwrap_or(defaults.endpoints.image_api_url),
            platform_base_url: get("WECHAT_API_BASE")
                .unwrap_or(defaults.endpoints.platform_base_url),
            placeholder_base_url: get("PLACEHOLDER_BASE_URL")
                .unwrap_or(defaults.endpoints.placeholder_base_url),
        };
        let credentials = Credentials {
            model_api_key: get("DASHSCOPE_API_KEY"),
            app_id: get("WECHAT_APP_ID"),
            app_secret: get("WECHAT_APP_SECRET"),
        };
        let publish_time = match get("PUBLISH_TIME") {
            Some(raw) => parse_publish_time(&raw)?,
            None => defaults.publish_time,
        };
        let save_to_draft = match get("SAVE_TO_DRAFT") {
            Some(raw) => parse_bool("SAVE_TO_DRAFT", &raw)?,
            None => defaults.save_to_draft,
        };

        Ok(Self {
            endpoints,
            credentials,
            chat_model: get("QWEN_MODEL").unwrap_or(defaults.chat_model),
            image_model: get("IMAGE_MODEL").unwrap_or(defaults.image_model),
            author: get("ARTICLE_AUTHOR").unwrap_or(defaults.author),
            fallback_image: get("FALLBACK_IMAGE")
                .map(PathBuf::from)
                .unwrap_or(defaults.fallback_image),
            drafts_dir: get("DRAFTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.drafts_dir),
            publish_time,
            save_to_draft,
            timeouts: defaults.timeouts,
            max_image_bytes: defaults.max_image_bytes,
        })
    }

    /// Looks up a relative fallback cover next to `base` (usually the
    /// executable's directory) when it is missing under the working directory.
    /// Output directories stay relative to the working directory.
    pub fn with_assets_near(mut self, base: &Path) -> Self {
        if self.fallback_image.is_relative() && !self.fallback_image.is_file() {
            let candidate = base.join(&self.fallback_image);
            if candidate.is_file() {
                self.fallback_image = candidate;
            }
        }
        self
    }
}

/// Parses `HH:MM` (24h).
pub fn parse_publish_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| ConfigError::Invalid {
        var: "PUBLISH_TIME",
        value: raw.to_string(),
        reason: "expected HH:MM",
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false",
        }),
    }
}
