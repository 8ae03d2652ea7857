//! BananaGen engine: reply parsing, prompt assembly, settings and the IO
//! around a generation.
mod avatar;
mod chat;
mod client;
mod defaults;
mod engine;
mod export;
mod extract;
mod filename;
mod generate;
mod markup;
mod migrate;
mod persist;
mod prompt;
mod reconcile;
mod serialize;
mod settings;
mod template;
mod token;
mod tree;
mod types;

pub use avatar::{load_data_url, AvatarError, AvatarKind, AvatarSource, FileAvatarSource};
pub use chat::{ChatContext, ChatError, HistoryRequest, Transcript, TranscriptContext, TranscriptMessage};
pub use client::{
    parse_reply, FailureKind, ModelClient, ModelReply, ModelRequest, ProviderPreference,
    RequestError, RequestSettings, ReqwestModelClient,
};
pub use defaults::{
    DEFAULT_CHAT_DESCRIPTION, DEFAULT_IMAGE_PROMPT_TEMPLATE, DEFAULT_PREVIOUS_PROMPTS,
    DEFAULT_RESPONSE_RULES, DEFAULT_TASK_DESCRIPTION, LEGACY_PREVIOUS_PROMPTS,
    LEGACY_TASK_DESCRIPTION,
};
pub use engine::{EngineEvent, EngineHandle};
pub use export::{export_image_entry, ExportError, ExportSummary};
pub use extract::{image_elements, ExtractOptions, Extractor, XmlPromptExtractor};
pub use filename::image_filename;
pub use generate::{
    run_image_generation, run_text_generation, Collaborators, GenerationError, ImageGeneration,
    ImageOutcome, TextGeneration,
};
pub use markup::{check_balance, merge_continuation, strip_code_fences, MarkupError};
pub use migrate::{migrate, Migration};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use prompt::{build_image_messages, build_text_messages, TextPromptParams};
pub use reconcile::reconcile_labels;
pub use serialize::{full_xml, prefilled_xml};
pub use settings::{
    convert_to_variable_name, default_prompt_content, ConnectionProfile, ContextToSend,
    ExtensionSettings, IndexRange, MainContextPromptBlock, MainContextTemplatePreset,
    MaxContextType, MessageSelection, PromptPreset, PromptSetting, SelectionKind, SettingsError,
    BUILT_IN_PROMPTS, CHAT_HISTORY_BLOCK, FORMAT_VERSION,
};
pub use template::{HandlebarsRenderer, TemplateError, TemplateRenderer};
pub use token::{fit_to_budget, TokenCounter, WhitespaceTokenCounter};
pub use tree::{parse_tree, XmlElement, XmlNode};
pub use types::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
