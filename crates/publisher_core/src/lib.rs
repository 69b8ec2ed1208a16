//! Publisher core: pure pipeline state machine and the domain types it moves around.
mod effect;
mod msg;
mod report;
mod state;
mod types;
mod update;

pub use effect::Effect;
pub use msg::Msg;
pub use report::RunReport;
pub use state::{PipelineState, Stage};
pub use types::{
    Article, CallError, DraftId, FailureKind, ImageReference, ImageTier, MediaId, RunOutcome,
    DEFAULT_IMAGE_PROMPT, DEFAULT_SUBJECT,
};
pub use update::update;
