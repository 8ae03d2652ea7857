use crate::effect::{ContinueFrom, ContinueMode, ImageRequest, TextRequest};
use crate::entry::{refinement_chain, Entry, EntryId, EntryKind};
use crate::state::PendingKind;
use crate::{AppState, Effect, GenerationFailure, ImageResult, Msg, NoticeLevel, RequestId};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PromptSubmitted { prompt } => {
            if refuse_while_busy(&mut state) {
                return (state, Vec::new());
            }
            if prompt.trim().is_empty() {
                state.set_notice(NoticeLevel::Warning, "Please enter a prompt.");
                return (state, Vec::new());
            }
            let request_id = state.begin(PendingKind::Text {
                continue_from: None,
            });
            vec![Effect::GenerateText(TextRequest {
                request_id,
                user_prompt: prompt,
                prior_entries: state.entries().to_vec(),
                continue_from: None,
            })]
        }
        Msg::ContinueClicked { id } => {
            start_text_from(&mut state, id, String::new(), ContinueMode::Continue)
        }
        Msg::ReviseSubmitted { id, instructions } => {
            start_text_from(&mut state, id, instructions, ContinueMode::Revise)
        }
        Msg::GenerateImageClicked {
            id,
            include_avatars,
        } => start_image(&mut state, id, None, include_avatars),
        Msg::RefineImageSubmitted {
            id,
            instructions,
            include_avatars,
        } => {
            let instructions = instructions.trim().to_string();
            if instructions.is_empty() {
                state.set_notice(NoticeLevel::Warning, "Please enter refinement instructions.");
                Vec::new()
            } else {
                start_image(&mut state, id, Some(instructions), include_avatars)
            }
        }
        Msg::DismissClicked { id } => {
            if !state.remove(id) {
                report_unknown(&mut state, id);
            }
            Vec::new()
        }
        Msg::PostToChatClicked { id } => match state.entry(id).cloned() {
            Some(entry) if entry.is_image() => vec![Effect::PostToChat { entry }],
            Some(_) => {
                state.set_notice(
                    NoticeLevel::Error,
                    "Only generated images can be posted to chat.",
                );
                Vec::new()
            }
            None => {
                report_unknown(&mut state, id);
                Vec::new()
            }
        },
        Msg::ResetClicked => {
            state.clear();
            Vec::new()
        }
        Msg::TextGenerationDone { request_id, result } => {
            apply_text_done(&mut state, request_id, result);
            Vec::new()
        }
        Msg::ImageGenerationDone { request_id, result } => {
            apply_image_done(&mut state, request_id, result);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn refuse_while_busy(state: &mut AppState) -> bool {
    if state.is_generating() {
        state.set_notice(NoticeLevel::Warning, "A generation is already running.");
        true
    } else {
        false
    }
}

fn report_unknown(state: &mut AppState, id: EntryId) {
    state.set_notice(NoticeLevel::Error, format!("No entry with id {id}."));
}

fn start_text_from(
    state: &mut AppState,
    id: EntryId,
    instructions: String,
    mode: ContinueMode,
) -> Vec<Effect> {
    if refuse_while_busy(state) {
        return Vec::new();
    }
    let Some(entry) = state.entry(id).cloned() else {
        report_unknown(state, id);
        return Vec::new();
    };
    if entry.kind != EntryKind::TextPrompt {
        state.set_notice(NoticeLevel::Warning, "Only text prompts can be continued or revised.");
        return Vec::new();
    }
    let request_id = state.begin(PendingKind::Text {
        continue_from: Some((id, mode)),
    });
    vec![Effect::GenerateText(TextRequest {
        request_id,
        user_prompt: instructions,
        prior_entries: state.entries().to_vec(),
        continue_from: Some(ContinueFrom { entry, mode }),
    })]
}

fn start_image(
    state: &mut AppState,
    id: EntryId,
    instruction: Option<String>,
    include_avatars: bool,
) -> Vec<Effect> {
    if refuse_while_busy(state) {
        return Vec::new();
    }
    let Some(source) = state.entry(id).cloned() else {
        report_unknown(state, id);
        return Vec::new();
    };
    let chain_image_refs = if instruction.is_some() {
        let mut refs: Vec<String> = refinement_chain(state.entries(), id)
            .into_iter()
            .filter(|e| e.kind == EntryKind::Image)
            .filter_map(|e| e.image_ref.clone())
            .collect();
        refs.reverse();
        refs
    } else {
        Vec::new()
    };
    let request_id = state.begin(PendingKind::Image {
        source: source.clone(),
        instruction: instruction.clone(),
    });
    vec![Effect::GenerateImage(ImageRequest {
        request_id,
        source,
        chain_image_refs,
        instruction,
        include_avatars,
    })]
}

fn apply_text_done(
    state: &mut AppState,
    request_id: RequestId,
    result: Result<Vec<Entry>, GenerationFailure>,
) {
    let Some(PendingKind::Text { continue_from }) = state.finish(request_id) else {
        return;
    };
    let entries = match result {
        Ok(entries) => entries,
        Err(failure) => {
            report_failure(state, &failure);
            return;
        }
    };
    if entries.is_empty() {
        state.set_notice(NoticeLevel::Warning, "No results from AI");
        return;
    }
    match continue_from {
        Some((source_id, _mode)) => {
            let Some(first) = entries.into_iter().next() else {
                return;
            };
            let replacement = Entry {
                parent_id: Some(source_id),
                kind: EntryKind::TextPrompt,
                ..first
            };
            state.replace(source_id, replacement);
            state.set_notice(NoticeLevel::Success, "Revised prompt.");
        }
        None => {
            let added: Vec<Entry> = entries
                .into_iter()
                .map(|e| Entry {
                    kind: EntryKind::TextPrompt,
                    ..e
                })
                .collect();
            let count = added.len();
            state.prepend(added);
            state.set_notice(NoticeLevel::Success, format!("Added {count} new prompts."));
        }
    }
}

fn apply_image_done(
    state: &mut AppState,
    request_id: RequestId,
    result: Result<ImageResult, GenerationFailure>,
) {
    let Some(PendingKind::Image {
        source,
        instruction,
    }) = state.finish(request_id)
    else {
        return;
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(failure) => {
            report_failure(state, &failure);
            return;
        }
    };
    let refining = instruction.is_some();
    let model_text = outcome.text.trim();
    match outcome.image_ref.filter(|r| !r.trim().is_empty()) {
        None => {
            let headline = if refining {
                "Image refinement failed. No image was returned."
            } else {
                "Image generation failed. No image was returned."
            };
            state.set_notice(NoticeLevel::Error, with_model_text(headline, model_text));
        }
        Some(image_ref) => {
            let label = instruction.map(|i| format!("Refined: {i}"));
            let image = Entry::image_from(state.next_entry_id(), &source, image_ref, label);
            state.prepend(vec![image]);
            let headline = if refining {
                "Image refined successfully!"
            } else {
                "Image generated successfully!"
            };
            state.set_notice(NoticeLevel::Success, with_model_text(headline, model_text));
        }
    }
}

fn with_model_text(headline: &str, model_text: &str) -> String {
    if model_text.is_empty() {
        headline.to_string()
    } else {
        format!("{headline}\n{model_text}")
    }
}

fn report_failure(state: &mut AppState, failure: &GenerationFailure) {
    let text = if failure.retryable {
        format!(
            "{} The model stopped early; try continuing the prompt.",
            failure.message
        )
    } else {
        failure.message.clone()
    };
    state.set_notice(NoticeLevel::Error, text);
}
