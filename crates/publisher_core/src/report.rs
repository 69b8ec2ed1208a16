use crate::{CallError, DraftId, ImageReference, ImageTier, MediaId, RunOutcome, Stage};

/// Read-only snapshot of a run, used for the final log summary and in tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub stage: Stage,
    /// Every stage entered, in order, starting with `SelectTopic`.
    pub history: Vec<Stage>,
    pub topic: Option<String>,
    pub title: Option<String>,
    pub image_tier: Option<ImageTier>,
    pub image: Option<ImageReference>,
    pub image_failures: Vec<(ImageTier, CallError)>,
    pub media_id: Option<MediaId>,
    pub draft_id: Option<DraftId>,
    pub outcome: Option<RunOutcome>,
}

impl RunReport {
    /// Exit status for the process; a run without an outcome counts as failed.
    pub fn exit_code(&self) -> u8 {
        self.outcome.as_ref().map_or(1, RunOutcome::exit_code)
    }

    /// Image tiers in the order they were attempted.
    pub fn attempted_tiers(&self) -> Vec<ImageTier> {
        self.history
            .iter()
            .filter_map(|stage| match stage {
                Stage::ObtainImage(tier) => Some(*tier),
                _ => None,
            })
            .collect()
    }

    pub fn reached(&self, stage: Stage) -> bool {
        self.history.contains(&stage)
    }
}
