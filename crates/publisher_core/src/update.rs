use crate::{
    CallError, Effect, FailureKind, ImageReference, ImageTier, Msg, PipelineState, RunOutcome,
    Stage,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not belong to the current stage are ignored, as is
/// everything once the run reached a terminal stage.
pub fn update(mut state: PipelineState, msg: Msg) -> (PipelineState, Vec<Effect>) {
    if state.stage().is_terminal() {
        return (state, Vec::new());
    }

    let effects = match (state.stage(), msg) {
        (Stage::SelectTopic, Msg::Start) => vec![Effect::SelectTopic],
        (Stage::SelectTopic, Msg::TopicSelected(topic)) => {
            state.set_topic(topic.clone());
            state.advance(Stage::GenerateArticle);
            vec![Effect::GenerateArticle { topic }]
        }
        (Stage::GenerateArticle, Msg::ArticleReady(article)) => {
            if article.title.trim().is_empty() {
                let reason = CallError::new(
                    FailureKind::MissingField("title"),
                    "generated article has an empty title",
                );
                return fail(state, Stage::GenerateArticle, reason);
            }
            let prompt = article.image_prompt_or_default().to_string();
            state.set_article(article);
            state.advance(Stage::ObtainImage(ImageTier::Generated));
            vec![Effect::GenerateImage { prompt }]
        }
        (Stage::ObtainImage(current), Msg::ImageResolved { tier, result }) if current == tier => {
            match result {
                Ok(reference) => {
                    state.set_image(tier, reference.clone());
                    state.advance(Stage::UploadMedia);
                    vec![Effect::UploadMedia { reference }]
                }
                Err(error) => {
                    state.record_image_failure(tier, error.clone());
                    match tier.next().and_then(|next| Some((next, fallback_effect(next)?))) {
                        Some((next, effect)) => {
                            state.advance(Stage::ObtainImage(next));
                            vec![effect]
                        }
                        None => return fail(state, Stage::ObtainImage(tier), error),
                    }
                }
            }
        }
        (Stage::UploadMedia, Msg::MediaUploaded(result)) => match result {
            Ok(media_id) => match state.article().cloned() {
                Some(article) => {
                    state.set_media_id(media_id.clone());
                    state.advance(Stage::CreateDraft);
                    vec![Effect::CreateDraft { article, media_id }]
                }
                None => return fail(state, Stage::UploadMedia, missing_article()),
            },
            Err(error) => archive(&mut state, error),
        },
        (Stage::CreateDraft, Msg::DraftCreated(result)) => match result {
            Ok(draft_id) => {
                state.set_draft_id(draft_id.clone());
                let outcome = RunOutcome::Published { draft_id };
                state.finish(Stage::Done, outcome.clone());
                vec![Effect::Finish(outcome)]
            }
            Err(error) => archive(&mut state, error),
        },
        (Stage::ArchiveLocalDraft, Msg::DraftArchived(result)) => {
            let reason = state
                .take_pending_failure()
                .unwrap_or_else(|| CallError::new(FailureKind::Io, "archived without a cause"));
            match result {
                Ok(path) => {
                    let outcome = RunOutcome::ArchivedLocally { path, reason };
                    state.finish(Stage::ArchivedLocallyFailed, outcome.clone());
                    vec![Effect::Finish(outcome)]
                }
                Err(error) => return fail(state, Stage::ArchiveLocalDraft, error),
            }
        }
        _ => Vec::new(),
    };

    (state, effects)
}

/// Effect for a fallback tier. The generated tier is only entered from an article.
fn fallback_effect(tier: ImageTier) -> Option<Effect> {
    match tier {
        ImageTier::Generated => None,
        ImageTier::Placeholder => Some(Effect::ProbePlaceholder),
        ImageTier::LocalFile => Some(Effect::LocateFallbackImage),
    }
}

fn archive(state: &mut PipelineState, reason: CallError) -> Vec<Effect> {
    let Some(article) = state.article().cloned() else {
        let outcome = RunOutcome::Failed {
            stage: state.stage(),
            reason: missing_article(),
        };
        state.finish(Stage::Failed, outcome.clone());
        return vec![Effect::Finish(outcome)];
    };
    let image: Option<ImageReference> = state.image().cloned();
    state.set_pending_failure(reason.clone());
    state.advance(Stage::ArchiveLocalDraft);
    vec![Effect::ArchiveDraft {
        article,
        image,
        reason,
    }]
}

fn fail(mut state: PipelineState, stage: Stage, reason: CallError) -> (PipelineState, Vec<Effect>) {
    let outcome = RunOutcome::Failed { stage, reason };
    state.finish(Stage::Failed, outcome.clone());
    (state, vec![Effect::Finish(outcome)])
}

fn missing_article() -> CallError {
    CallError::new(FailureKind::MissingResource, "no article in pipeline state")
}
