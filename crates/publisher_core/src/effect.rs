use crate::{Article, CallError, ImageReference, MediaId, RunOutcome};

/// Work the engine must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SelectTopic,
    GenerateArticle { topic: String },
    GenerateImage { prompt: String },
    ProbePlaceholder,
    LocateFallbackImage,
    UploadMedia { reference: ImageReference },
    CreateDraft { article: Article, media_id: MediaId },
    ArchiveDraft {
        article: Article,
        image: Option<ImageReference>,
        reason: CallError,
    },
    Finish(RunOutcome),
}
