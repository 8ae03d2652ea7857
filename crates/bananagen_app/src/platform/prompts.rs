use bananagen_engine::{default_prompt_content, ExtensionSettings, SettingsError};

use super::cli::PromptCommand;

/// Result of a `prompt` command: text for the user, and whether the settings
/// need saving.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct PromptEdit {
    pub message: String,
    pub changed: bool,
}

impl PromptEdit {
    fn saved(message: String) -> Self {
        Self {
            message,
            changed: true,
        }
    }
}

pub(crate) fn apply(
    settings: &mut ExtensionSettings,
    command: PromptCommand,
) -> Result<PromptEdit, SettingsError> {
    match command {
        PromptCommand::List => Ok(PromptEdit {
            message: list(settings),
            changed: false,
        }),
        PromptCommand::Add { label, content } => {
            let key = settings.add_custom_prompt(&label, &content.join(" "))?;
            Ok(PromptEdit::saved(format!("Added prompt {key}.")))
        }
        PromptCommand::Set { key, content } => {
            settings.set_prompt_content(&key, &content.join(" "))?;
            Ok(PromptEdit::saved(format!("Updated prompt {key}.")))
        }
        PromptCommand::Reset { key } => {
            settings.reset_prompt(&key)?;
            Ok(PromptEdit::saved(format!("Prompt {key} restored to default.")))
        }
    }
}

fn list(settings: &ExtensionSettings) -> String {
    settings
        .prompts
        .iter()
        .map(|(key, prompt)| {
            let state = match default_prompt_content(key) {
                None => " (custom)",
                Some(_) if !prompt.is_default => " (edited)",
                Some(_) => "",
            };
            format!("{key}: {}{state}", prompt.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
