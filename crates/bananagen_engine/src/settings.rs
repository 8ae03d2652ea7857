use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_CHAT_DESCRIPTION, DEFAULT_IMAGE_PROMPT_TEMPLATE, DEFAULT_PREVIOUS_PROMPTS,
    DEFAULT_RESPONSE_RULES, DEFAULT_TASK_DESCRIPTION,
};
use crate::types::Role;

pub const VERSION: &str = "0.1.0";
pub const FORMAT_VERSION: &str = "F_1.2";

/// Main-context block name that stands for the chat transcript rather than a
/// prompt template.
pub const CHAT_HISTORY_BLOCK: &str = "chatHistory";

/// Built-in prompt keys and their display labels.
pub const BUILT_IN_PROMPTS: [(&str, &str); 5] = [
    ("stDescription", "Chat Front-end Description"),
    ("possibleSteps", "Previous Prompts"),
    ("responseRules", "Response Rules"),
    ("taskDescription", "Task Description"),
    ("imagePromptTemplate", "Image Prompt Template"),
];

pub fn default_prompt_content(key: &str) -> Option<&'static str> {
    match key {
        "stDescription" => Some(DEFAULT_CHAT_DESCRIPTION),
        "possibleSteps" => Some(DEFAULT_PREVIOUS_PROMPTS),
        "responseRules" => Some(DEFAULT_RESPONSE_RULES),
        "taskDescription" => Some(DEFAULT_TASK_DESCRIPTION),
        "imagePromptTemplate" => Some(DEFAULT_IMAGE_PROMPT_TEMPLATE),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("No connection profile selected.")]
    NoProfileSelected,
    #[error("Connection profile with ID \"{0}\" not found.")]
    ProfileNotFound(String),
    #[error("Could not determine API for profile \"{0}\".")]
    ProfileIncomplete(String),
    #[error("Main context template preset \"{0}\" not found.")]
    UnknownTemplatePreset(String),
    #[error("Prompt name \"{0}\" does not produce a usable key.")]
    InvalidPromptName(String),
    #[error("A prompt with key \"{0}\" already exists.")]
    DuplicatePrompt(String),
    #[error("\"{0}\" is not a built-in prompt.")]
    NotBuiltIn(String),
    #[error("No prompt with key \"{0}\".")]
    UnknownPrompt(String),
    #[error("unsupported settings format {0}")]
    UnsupportedFormat(String),
    #[error("malformed settings: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaxContextType {
    /// Use the context size configured on the connection profile.
    #[default]
    Profile,
    /// Use the active sampler's context size.
    Sampler,
    /// Use `max_context_value`.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    None,
    #[default]
    All,
    First,
    Last,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

/// Which chat messages go into the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSelection {
    #[serde(rename = "type")]
    pub kind: SelectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<IndexRange>,
}

impl Default for MessageSelection {
    fn default() -> Self {
        Self {
            kind: SelectionKind::All,
            first: Some(10),
            last: Some(10),
            range: Some(IndexRange { start: 0, end: 10 }),
        }
    }
}

impl MessageSelection {
    /// Inclusive index window into a chat of `chat_len` messages, or `None`
    /// when nothing should be sent.
    pub fn window(&self, chat_len: usize) -> Option<RangeInclusive<usize>> {
        if chat_len == 0 {
            return None;
        }
        let last_index = chat_len - 1;
        match self.kind {
            SelectionKind::None => None,
            SelectionKind::All => Some(0..=last_index),
            SelectionKind::First => match self.first.unwrap_or(10).min(chat_len) {
                0 => None,
                n => Some(0..=n - 1),
            },
            SelectionKind::Last => match self.last.unwrap_or(10).min(chat_len) {
                0 => None,
                n => Some(chat_len - n..=last_index),
            },
            SelectionKind::Range => {
                let range = self.range?;
                let end = range.end.min(last_index);
                (range.start <= end).then_some(range.start..=end)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextToSend {
    pub st_description: bool,
    pub messages: MessageSelection,
    pub char_card: bool,
    pub author_note: bool,
    pub world_info: bool,
    pub suggested_entries: bool,
}

impl Default for ContextToSend {
    fn default() -> Self {
        Self {
            st_description: true,
            messages: MessageSelection::default(),
            char_card: true,
            author_note: true,
            world_info: true,
            suggested_entries: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSetting {
    pub label: String,
    pub content: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PromptPreset {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainContextPromptBlock {
    pub prompt_name: String,
    pub enabled: bool,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MainContextTemplatePreset {
    pub prompts: Vec<MainContextPromptBlock>,
}

/// An OpenAI-compatible endpoint plus model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionProfile {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub model: String,
    /// Context window of the model, in tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_size: Option<u32>,
    /// Name of the environment variable holding the API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtensionSettings {
    pub version: String,
    pub format_version: String,
    pub profile_id: String,
    pub image_profile_id: String,
    pub max_context_type: MaxContextType,
    pub max_context_value: u32,
    pub max_response_token: u32,
    pub context_to_send: ContextToSend,
    pub prompts: BTreeMap<String, PromptSetting>,
    pub prompt_preset: String,
    pub prompt_presets: BTreeMap<String, PromptPreset>,
    pub main_context_template_preset: String,
    pub main_context_template_presets: BTreeMap<String, MainContextTemplatePreset>,
    pub profiles: Vec<ConnectionProfile>,
    /// Provider routing preference sent with image requests.
    pub image_provider_order: Vec<String>,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        let prompts = BUILT_IN_PROMPTS
            .iter()
            .filter_map(|(key, label)| {
                default_prompt_content(key).map(|content| {
                    (
                        key.to_string(),
                        PromptSetting {
                            label: label.to_string(),
                            content: content.to_string(),
                            is_default: true,
                        },
                    )
                })
            })
            .collect();

        let block = |name: &str, role: Role| MainContextPromptBlock {
            prompt_name: name.to_string(),
            enabled: true,
            role,
        };

        Self {
            version: VERSION.to_string(),
            format_version: FORMAT_VERSION.to_string(),
            profile_id: String::new(),
            image_profile_id: String::new(),
            max_context_type: MaxContextType::Profile,
            max_context_value: 16384,
            max_response_token: 8192,
            context_to_send: ContextToSend::default(),
            prompts,
            prompt_preset: "default".to_string(),
            prompt_presets: BTreeMap::from([("default".to_string(), PromptPreset::default())]),
            main_context_template_preset: "default".to_string(),
            main_context_template_presets: BTreeMap::from([(
                "default".to_string(),
                MainContextTemplatePreset {
                    prompts: vec![
                        block(CHAT_HISTORY_BLOCK, Role::System),
                        block("stDescription", Role::System),
                        block("possibleSteps", Role::System),
                        block("responseRules", Role::System),
                        block("taskDescription", Role::User),
                    ],
                },
            )]),
            profiles: Vec::new(),
            image_provider_order: vec!["Google".to_string()],
        }
    }
}

impl ExtensionSettings {
    pub fn text_profile(&self) -> Result<&ConnectionProfile, SettingsError> {
        self.profile(&self.profile_id)
    }

    pub fn image_profile(&self) -> Result<&ConnectionProfile, SettingsError> {
        self.profile(&self.image_profile_id)
    }

    pub fn profile(&self, id: &str) -> Result<&ConnectionProfile, SettingsError> {
        if id.is_empty() {
            return Err(SettingsError::NoProfileSelected);
        }
        let profile = self
            .profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| SettingsError::ProfileNotFound(id.to_string()))?;
        if profile.base_url.trim().is_empty() || profile.model.trim().is_empty() {
            let name = if profile.name.is_empty() {
                &profile.id
            } else {
                &profile.name
            };
            return Err(SettingsError::ProfileIncomplete(name.clone()));
        }
        Ok(profile)
    }

    /// Token budget for chat history: the context window minus room for the
    /// response.
    pub fn history_budget(&self, profile: &ConnectionProfile) -> u32 {
        let context = match self.max_context_type {
            MaxContextType::Custom => self.max_context_value,
            MaxContextType::Profile | MaxContextType::Sampler => {
                profile.context_size.unwrap_or(self.max_context_value)
            }
        };
        context.saturating_sub(self.max_response_token)
    }

    /// Text of the selected prompt preset, used when the user gives no prompt.
    pub fn active_preset_content(&self) -> &str {
        self.prompt_presets
            .get(&self.prompt_preset)
            .map(|p| p.content.as_str())
            .unwrap_or_default()
    }

    /// Enabled blocks of the selected main-context template, in order.
    pub fn active_main_context(&self) -> Result<Vec<MainContextPromptBlock>, SettingsError> {
        let preset = self
            .main_context_template_presets
            .get(&self.main_context_template_preset)
            .ok_or_else(|| {
                SettingsError::UnknownTemplatePreset(self.main_context_template_preset.clone())
            })?;
        Ok(preset.prompts.iter().filter(|b| b.enabled).cloned().collect())
    }

    /// Prompt templates that may be rendered, honouring `context_to_send`.
    pub fn effective_prompts(&self) -> BTreeMap<String, PromptSetting> {
        let mut prompts = self.prompts.clone();
        if !self.context_to_send.st_description {
            prompts.remove("stDescription");
        }
        prompts
    }

    pub fn image_prompt_template(&self) -> &str {
        self.prompts
            .get("imagePromptTemplate")
            .map(|p| p.content.as_str())
            .unwrap_or(DEFAULT_IMAGE_PROMPT_TEMPLATE)
    }

    /// Adds a user prompt under a key derived from `label`; returns the key.
    pub fn add_custom_prompt(
        &mut self,
        label: &str,
        content: &str,
    ) -> Result<String, SettingsError> {
        let key = convert_to_variable_name(label);
        if key.is_empty() || key == CHAT_HISTORY_BLOCK {
            return Err(SettingsError::InvalidPromptName(label.to_string()));
        }
        if self.prompts.contains_key(&key) {
            return Err(SettingsError::DuplicatePrompt(key));
        }
        self.prompts.insert(
            key.clone(),
            PromptSetting {
                label: label.to_string(),
                content: content.to_string(),
                is_default: false,
            },
        );
        Ok(key)
    }

    /// Replaces a prompt's content, tracking whether it still matches the
    /// built-in default.
    pub fn set_prompt_content(&mut self, key: &str, content: &str) -> Result<(), SettingsError> {
        let prompt = self
            .prompts
            .get_mut(key)
            .ok_or_else(|| SettingsError::UnknownPrompt(key.to_string()))?;
        prompt.content = content.to_string();
        prompt.is_default = default_prompt_content(key) == Some(content);
        Ok(())
    }

    pub fn reset_prompt(&mut self, key: &str) -> Result<(), SettingsError> {
        let content =
            default_prompt_content(key).ok_or_else(|| SettingsError::NotBuiltIn(key.to_string()))?;
        let label = BUILT_IN_PROMPTS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| key.to_string());
        let prompt = self.prompts.entry(key.to_string()).or_insert(PromptSetting {
            label,
            content: String::new(),
            is_default: true,
        });
        prompt.content = content.to_string();
        prompt.is_default = true;
        Ok(())
    }
}

/// Turns a free-form label into a camelCase key: ASCII word characters only,
/// leading digits dropped from each word.
pub fn convert_to_variable_name(label: &str) -> String {
    let normalized: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut out = String::new();
    for word in normalized.split_whitespace() {
        let word = word.trim_start_matches(|c: char| c.is_ascii_digit());
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        if out.is_empty() {
            out.push_str(&word.to_lowercase());
        } else {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}
