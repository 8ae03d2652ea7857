use serde_json::{Map, Value};

use crate::defaults::{
    DEFAULT_PREVIOUS_PROMPTS, DEFAULT_TASK_DESCRIPTION, LEGACY_PREVIOUS_PROMPTS,
    LEGACY_TASK_DESCRIPTION,
};
use crate::settings::{ExtensionSettings, SettingsError, FORMAT_VERSION};

/// Top-level keys used by F_1.0 before prompts moved into the `prompts` map.
const LEGACY_PROMPT_KEYS: [&str; 8] = [
    "stWorldInfoPrompt",
    "usingDefaultStWorldInfoPrompt",
    "lorebookDefinitionPrompt",
    "usingDefaultLorebookDefinitionPrompt",
    "lorebookRulesPrompt",
    "usingDefaultLorebookRulesPrompt",
    "responseRulesPrompt",
    "usingDefaultResponseRulesPrompt",
];

/// Settings read from disk, brought up to the current format.
#[derive(Debug, Clone)]
pub struct Migration {
    pub settings: ExtensionSettings,
    /// Format the stored document was written in.
    pub from: String,
    /// A stored template was replaced because it used retired data fields.
    pub templates_upgraded: bool,
}

impl Migration {
    pub fn changed(&self) -> bool {
        self.from != FORMAT_VERSION || self.templates_upgraded
    }
}

/// Upgrades a stored settings document step by step and deserializes it.
/// A document without `formatVersion` is treated as F_1.0.
pub fn migrate(raw: Value) -> Result<Migration, SettingsError> {
    let Value::Object(mut doc) = raw else {
        return Err(SettingsError::UnsupportedFormat(
            "settings document is not an object".to_string(),
        ));
    };

    let from = doc
        .get("formatVersion")
        .and_then(Value::as_str)
        .unwrap_or("F_1.0")
        .to_string();

    let mut version = from.clone();
    loop {
        match version.as_str() {
            "F_1.0" => {
                doc = f1_0_to_f1_1(doc)?;
                version = "F_1.1".to_string();
            }
            "F_1.1" => {
                f1_1_to_f1_2(&mut doc);
                version = "F_1.2".to_string();
            }
            v if v == FORMAT_VERSION => break,
            other => return Err(SettingsError::UnsupportedFormat(other.to_string())),
        }
    }

    // Older releases wrote this template under the current format too.
    let templates_upgraded = replace_legacy_prompt(
        &mut doc,
        "possibleSteps",
        LEGACY_PREVIOUS_PROMPTS,
        DEFAULT_PREVIOUS_PROMPTS,
    );

    let settings: ExtensionSettings = serde_json::from_value(Value::Object(doc))?;
    Ok(Migration {
        settings,
        from,
        templates_upgraded,
    })
}

fn f1_0_to_f1_1(previous: Map<String, Value>) -> Result<Map<String, Value>, SettingsError> {
    let Value::Object(mut merged) = serde_json::to_value(ExtensionSettings::default())? else {
        return Err(SettingsError::UnsupportedFormat("F_1.0".to_string()));
    };
    merged.extend(previous);
    for key in LEGACY_PROMPT_KEYS {
        merged.remove(key);
    }
    merged.insert("formatVersion".to_string(), Value::from("F_1.1"));
    Ok(merged)
}

fn f1_1_to_f1_2(doc: &mut Map<String, Value>) {
    doc.insert("formatVersion".to_string(), Value::from("F_1.2"));
    replace_legacy_prompt(
        doc,
        "taskDescription",
        LEGACY_TASK_DESCRIPTION,
        DEFAULT_TASK_DESCRIPTION,
    );

    if let Some(task) = stored_prompt(doc, "taskDescription") {
        let is_default =
            task.get("content").and_then(Value::as_str) == Some(DEFAULT_TASK_DESCRIPTION);
        task.insert("isDefault".to_string(), Value::from(is_default));
    }
}

fn stored_prompt<'a>(
    doc: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    doc.get_mut("prompts")
        .and_then(|p| p.get_mut(key))
        .and_then(Value::as_object_mut)
}

/// Swaps a prompt still holding a retired default for the current one.
/// Returns whether anything changed.
fn replace_legacy_prompt(
    doc: &mut Map<String, Value>,
    key: &str,
    legacy: &str,
    current: &str,
) -> bool {
    let Some(prompt) = stored_prompt(doc, key) else {
        return false;
    };
    if prompt.get("content").and_then(Value::as_str) != Some(legacy) {
        return false;
    }
    prompt.insert("content".to_string(), Value::from(current));
    prompt.insert("isDefault".to_string(), Value::from(true));
    true
}
