//! The conversation the prompts are drafted from.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::token::{fit_to_budget, TokenCounter, WhitespaceTokenCounter};
use crate::types::{ChatMessage, Role};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("failed to read transcript {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed transcript {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What part of the chat to include in a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Message index window; `None` sends no messages.
    pub window: Option<RangeInclusive<usize>>,
    pub include_character_card: bool,
    pub include_author_note: bool,
    pub include_world_info: bool,
    pub max_context_tokens: u32,
}

/// Read access to the host chat.
pub trait ChatContext: Send + Sync {
    fn user_name(&self) -> &str;
    fn char_name(&self) -> &str;
    fn persona(&self) -> &str;
    fn has_active_character(&self) -> bool;
    fn message_count(&self) -> usize;
    fn history(&self, request: &HistoryRequest) -> Vec<ChatMessage>;

    /// Fills `{{user}}`, `{{char}}` and `{{persona}}`.
    fn substitute_params(&self, text: &str) -> String {
        text.replace("{{user}}", self.user_name())
            .replace("{{char}}", self.char_name())
            .replace("{{persona}}", self.persona())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    pub name: String,
    #[serde(default)]
    pub is_user: bool,
    pub text: String,
}

/// A saved chat loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Transcript {
    pub user_name: String,
    pub char_name: String,
    pub persona: String,
    pub character_card: String,
    pub author_note: String,
    pub world_info: Vec<String>,
    pub messages: Vec<TranscriptMessage>,
}

pub struct TranscriptContext {
    transcript: Transcript,
    counter: Box<dyn TokenCounter>,
}

impl TranscriptContext {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            counter: Box::new(WhitespaceTokenCounter),
        }
    }

    pub fn with_counter(mut self, counter: Box<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ChatError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let transcript = serde_json::from_str(&raw).map_err(|source| ChatError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(transcript))
    }

    /// No chat at all; prompts are drafted from the user's instructions only.
    pub fn empty() -> Self {
        Self::new(Transcript::default())
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

impl ChatContext for TranscriptContext {
    fn user_name(&self) -> &str {
        &self.transcript.user_name
    }

    fn char_name(&self) -> &str {
        &self.transcript.char_name
    }

    fn persona(&self) -> &str {
        &self.transcript.persona
    }

    fn has_active_character(&self) -> bool {
        !self.transcript.char_name.is_empty()
    }

    fn message_count(&self) -> usize {
        self.transcript.messages.len()
    }

    fn history(&self, request: &HistoryRequest) -> Vec<ChatMessage> {
        let t = &self.transcript;
        let mut preamble = Vec::new();
        if request.include_character_card && !t.character_card.trim().is_empty() {
            preamble.push(ChatMessage::text(
                Role::System,
                self.substitute_params(&t.character_card),
            ));
        }
        if request.include_world_info && !t.world_info.is_empty() {
            preamble.push(ChatMessage::text(
                Role::System,
                self.substitute_params(&t.world_info.join("\n")),
            ));
        }

        let mut messages: Vec<ChatMessage> = match &request.window {
            Some(window) => t
                .messages
                .iter()
                .enumerate()
                .filter(|(i, _)| window.contains(i))
                .map(|(_, m)| {
                    let role = if m.is_user { Role::User } else { Role::Assistant };
                    ChatMessage::text(role, format!("{}: {}", m.name, m.text))
                })
                .collect(),
            None => Vec::new(),
        };

        let author_note = (request.include_author_note && !t.author_note.trim().is_empty())
            .then(|| ChatMessage::text(Role::System, self.substitute_params(&t.author_note)));

        let fixed_cost: u32 = preamble
            .iter()
            .chain(author_note.iter())
            .map(|m| self.counter.count(&m.text_content()))
            .sum();
        let budget = request.max_context_tokens.saturating_sub(fixed_cost);
        let dropped = fit_to_budget(&mut messages, budget, self.counter.as_ref());
        if dropped > 0 {
            engine_logging::engine_debug!(
                "dropped {} oldest chat messages to fit {} tokens",
                dropped,
                budget
            );
        }

        preamble.extend(messages);
        preamble.extend(author_note);
        preamble
    }
}
