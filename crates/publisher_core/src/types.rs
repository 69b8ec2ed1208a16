use std::fmt;
use std::path::PathBuf;

/// Subject used when the topic string is empty.
pub const DEFAULT_SUBJECT: &str = "AI软件测试";

/// Image prompt used when the generated article does not carry one.
pub const DEFAULT_IMAGE_PROMPT: &str = "AI software testing, futuristic technology, blue tone, 4k";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Presentational markup (`<h2>`, `<h3>`, `<p>`).
    pub content: String,
    pub summary: String,
    pub image_prompt: String,
}

impl Article {
    /// Digest shown by the platform; falls back to the title when the summary is blank.
    pub fn digest(&self) -> &str {
        if self.summary.trim().is_empty() {
            &self.title
        } else {
            &self.summary
        }
    }

    pub fn image_prompt_or_default(&self) -> &str {
        if self.image_prompt.trim().is_empty() {
            DEFAULT_IMAGE_PROMPT
        } else {
            &self.image_prompt
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    Remote(String),
    Local(PathBuf),
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageReference::Remote(url) => write!(f, "{url}"),
            ImageReference::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Image sources, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTier {
    Generated,
    Placeholder,
    LocalFile,
}

impl ImageTier {
    pub fn next(self) -> Option<ImageTier> {
        match self {
            ImageTier::Generated => Some(ImageTier::Placeholder),
            ImageTier::Placeholder => Some(ImageTier::LocalFile),
            ImageTier::LocalFile => None,
        }
    }
}

impl fmt::Display for ImageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageTier::Generated => write!(f, "generated"),
            ImageTier::Placeholder => write!(f, "placeholder"),
            ImageTier::LocalFile => write!(f, "local file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MalformedResponse,
    MissingField(&'static str),
    Api { code: i64, message: String },
    MissingCredentials,
    MissingResource,
    NoImageReference,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::MissingField(field) => write!(f, "missing field {field}"),
            FailureKind::Api { code, message } => write!(f, "api error {code}: {message}"),
            FailureKind::MissingCredentials => write!(f, "missing credentials"),
            FailureKind::MissingResource => write!(f, "missing resource"),
            FailureKind::NoImageReference => write!(f, "no image reference in response"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Failure of a single external call, as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    pub kind: FailureKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for CallError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published {
        draft_id: DraftId,
    },
    /// Upload or draft creation failed but the article was written to disk.
    ArchivedLocally {
        path: PathBuf,
        reason: CallError,
    },
    Failed {
        stage: crate::Stage,
        reason: CallError,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Published { .. })
    }

    /// Process exit status: 0 on full success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
