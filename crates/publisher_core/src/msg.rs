use crate::{Article, CallError, DraftId, ImageReference, ImageTier, MediaId};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Kick off a fresh run.
    Start,
    /// Topic selector produced today's topic.
    TopicSelected(String),
    /// Article generator returned; always carries an article (possibly the canned one).
    ArticleReady(Article),
    /// One image tier finished.
    ImageResolved {
        tier: ImageTier,
        result: Result<ImageReference, CallError>,
    },
    /// Media upload finished.
    MediaUploaded(Result<MediaId, CallError>),
    /// Draft creation finished.
    DraftCreated(Result<DraftId, CallError>),
    /// Local archive write finished.
    DraftArchived(Result<PathBuf, CallError>),
}
