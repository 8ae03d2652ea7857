//! Message lists sent to the text and image models.

use bananagen_core::{ContinueFrom, ContinueMode, Entry, ImageRequest};
use serde_json::{json, Value};

use crate::avatar::{AvatarKind, AvatarSource};
use crate::chat::{ChatContext, HistoryRequest};
use crate::generate::GenerationError;
use crate::serialize::{full_xml, prefilled_xml};
use crate::settings::{ExtensionSettings, CHAT_HISTORY_BLOCK};
use crate::template::TemplateRenderer;
use crate::types::{ChatMessage, ContentPart, MessageContent, Role};

pub struct TextPromptParams<'a> {
    pub user_prompt: &'a str,
    pub prior_entries: &'a [Entry],
    pub continue_from: Option<&'a ContinueFrom>,
    pub settings: &'a ExtensionSettings,
    /// Tokens available for chat history.
    pub history_budget: u32,
}

fn entry_data(entries: &[Entry]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "label": e.label,
                    "body": e.body,
                    "isImage": e.is_image(),
                })
            })
            .collect(),
    )
}

pub fn build_text_messages(
    params: &TextPromptParams<'_>,
    renderer: &dyn TemplateRenderer,
    chat: &dyn ChatContext,
) -> Result<Vec<ChatMessage>, GenerationError> {
    let settings = params.settings;
    let user_prompt = params.user_prompt.trim();
    let revising = matches!(
        params.continue_from,
        Some(ContinueFrom {
            mode: ContinueMode::Revise,
            ..
        })
    );

    // Host placeholders pass through rendering and are filled per message.
    let mut data = json!({
        "user": "{{user}}",
        "char": "{{char}}",
        "persona": "{{persona}}",
        "isRevising": revising,
    });
    let instructions = if revising {
        String::new()
    } else {
        renderer.render(user_prompt, &data)?
    };
    data["userInstructions"] = Value::from(instructions);
    data["entries"] = if settings.context_to_send.suggested_entries {
        entry_data(params.prior_entries)
    } else {
        Value::Array(Vec::new())
    };

    let prompts = settings.effective_prompts();
    let mut messages = Vec::new();
    for block in settings.active_main_context()? {
        if block.prompt_name == CHAT_HISTORY_BLOCK {
            let ctx = &settings.context_to_send;
            messages.extend(chat.history(&HistoryRequest {
                window: ctx.messages.window(chat.message_count()),
                include_character_card: ctx.char_card && chat.has_active_character(),
                include_author_note: ctx.author_note,
                include_world_info: ctx.world_info,
                max_context_tokens: params.history_budget,
            }));
            continue;
        }

        let Some(prompt) = prompts.get(&block.prompt_name) else {
            continue;
        };
        let content = chat.substitute_params(&renderer.render(&prompt.content, &data)?);
        if !content.is_empty() {
            messages.push(ChatMessage::text(block.role, content));
        }
    }

    match params.continue_from {
        Some(ContinueFrom {
            entry,
            mode: ContinueMode::Continue,
        }) => messages.push(ChatMessage::text(Role::Assistant, prefilled_xml(entry))),
        Some(ContinueFrom {
            entry,
            mode: ContinueMode::Revise,
        }) => {
            messages.push(ChatMessage::text(Role::Assistant, full_xml(entry)));
            if !user_prompt.is_empty() {
                messages.push(ChatMessage::text(Role::User, user_prompt));
            }
        }
        None => {}
    }

    Ok(messages)
}

/// One user message: the rendered instruction, then the refinement chain's
/// images oldest first, then any requested avatars.
pub fn build_image_messages(
    request: &ImageRequest,
    template: &str,
    renderer: &dyn TemplateRenderer,
    avatars: &dyn AvatarSource,
) -> Result<Vec<ChatMessage>, GenerationError> {
    let description = request
        .instruction
        .as_deref()
        .unwrap_or(request.source.body.as_str());
    let text = renderer.render(template, &json!({ "imageDescription": description }))?;

    let mut images: Vec<ContentPart> = request
        .chain_image_refs
        .iter()
        .map(ContentPart::image)
        .collect();
    if request.include_avatars {
        images.extend(
            AvatarKind::ALL
                .into_iter()
                .filter_map(|kind| avatars.avatar_data_url(kind))
                .map(ContentPart::image),
        );
    }

    let content = if images.is_empty() {
        MessageContent::Text(text)
    } else {
        let mut parts = vec![ContentPart::Text { text }];
        parts.extend(images);
        MessageContent::Parts(parts)
    };

    Ok(vec![ChatMessage {
        role: Role::User,
        content,
    }])
}
