use crate::report::RunReport;
use crate::{Article, CallError, DraftId, ImageReference, ImageTier, MediaId, RunOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    SelectTopic,
    GenerateArticle,
    ObtainImage(ImageTier),
    UploadMedia,
    CreateDraft,
    ArchiveLocalDraft,
    Done,
    ArchivedLocallyFailed,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Stage::Done | Stage::ArchivedLocallyFailed | Stage::Failed
        )
    }
}

/// State of one pipeline run. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineState {
    stage: Stage,
    history: Vec<Stage>,
    topic: Option<String>,
    article: Option<Article>,
    image: Option<(ImageTier, ImageReference)>,
    image_failures: Vec<(ImageTier, CallError)>,
    media_id: Option<MediaId>,
    draft_id: Option<DraftId>,
    pending_failure: Option<CallError>,
    outcome: Option<RunOutcome>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            history: vec![Stage::SelectTopic],
            ..Self::default()
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    pub fn image(&self) -> Option<&ImageReference> {
        self.image.as_ref().map(|(_, reference)| reference)
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            stage: self.stage,
            history: self.history.clone(),
            topic: self.topic.clone(),
            title: self.article.as_ref().map(|article| article.title.clone()),
            image_tier: self.image.as_ref().map(|(tier, _)| *tier),
            image: self.image.as_ref().map(|(_, reference)| reference.clone()),
            image_failures: self.image_failures.clone(),
            media_id: self.media_id.clone(),
            draft_id: self.draft_id.clone(),
            outcome: self.outcome.clone(),
        }
    }

    pub(crate) fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        self.history.push(stage);
    }

    pub(crate) fn set_topic(&mut self, topic: String) {
        self.topic = Some(topic);
    }

    pub(crate) fn set_article(&mut self, article: Article) {
        self.article = Some(article);
    }

    pub(crate) fn set_image(&mut self, tier: ImageTier, reference: ImageReference) {
        self.image = Some((tier, reference));
    }

    pub(crate) fn record_image_failure(&mut self, tier: ImageTier, error: CallError) {
        self.image_failures.push((tier, error));
    }

    pub(crate) fn set_media_id(&mut self, media_id: MediaId) {
        self.media_id = Some(media_id);
    }

    pub(crate) fn set_draft_id(&mut self, draft_id: DraftId) {
        self.draft_id = Some(draft_id);
    }

    pub(crate) fn set_pending_failure(&mut self, error: CallError) {
        self.pending_failure = Some(error);
    }

    pub(crate) fn take_pending_failure(&mut self) -> Option<CallError> {
        self.pending_failure.take()
    }

    pub(crate) fn finish(&mut self, stage: Stage, outcome: RunOutcome) {
        self.advance(stage);
        self.outcome = Some(outcome);
    }
}
