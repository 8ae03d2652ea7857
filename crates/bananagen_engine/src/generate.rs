//! Text and image generation: settings lookup, prompt assembly, the model
//! call, and turning the reply into entries.

use std::sync::Arc;

use bananagen_core::{
    ContinueMode, Entry, GenerationFailure, IdAllocator, ImageRequest, ImageResult, TextRequest,
};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::avatar::AvatarSource;
use crate::chat::ChatContext;
use crate::client::{ModelClient, ModelRequest, ProviderPreference, RequestError};
use crate::extract::{ExtractOptions, Extractor};
use crate::markup::MarkupError;
use crate::prompt::{build_image_messages, build_text_messages, TextPromptParams};
use crate::reconcile::reconcile_labels;
use crate::serialize::prefilled_xml;
use crate::settings::{ExtensionSettings, SettingsError};
use crate::template::{TemplateError, TemplateRenderer};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("request failed: {0}")]
    Request(#[from] RequestError),
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

impl GenerationError {
    /// Only a reply that stopped mid-document is worth continuing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Markup(err) if err.is_incomplete())
    }

    pub fn to_failure(&self) -> GenerationFailure {
        GenerationFailure::new(self.to_string(), self.is_retryable())
    }
}

/// Everything generation talks to, injected by the caller.
#[derive(Clone)]
pub struct Collaborators {
    pub client: Arc<dyn ModelClient>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub chat: Arc<dyn ChatContext>,
    pub avatars: Arc<dyn AvatarSource>,
    pub extractor: Arc<dyn Extractor>,
    pub ids: IdAllocator,
}

#[derive(Debug, Clone)]
pub struct TextGeneration {
    pub request: TextRequest,
    pub settings: ExtensionSettings,
}

#[derive(Debug, Clone)]
pub struct ImageGeneration {
    pub request: ImageRequest,
    pub settings: ExtensionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageOutcome {
    pub image_ref: Option<String>,
    pub text: String,
}

impl From<ImageOutcome> for ImageResult {
    fn from(outcome: ImageOutcome) -> Self {
        ImageResult {
            image_ref: outcome.image_ref,
            text: outcome.text,
        }
    }
}

pub async fn run_text_generation(
    job: &TextGeneration,
    deps: &Collaborators,
) -> Result<Vec<Entry>, GenerationError> {
    let settings = &job.settings;
    let request = &job.request;
    let profile = settings.text_profile()?;

    let messages = build_text_messages(
        &TextPromptParams {
            user_prompt: &request.user_prompt,
            prior_entries: &request.prior_entries,
            continue_from: request.continue_from.as_ref(),
            settings,
            history_budget: settings.history_budget(profile),
        },
        deps.renderer.as_ref(),
        deps.chat.as_ref(),
    )?;
    engine_info!(
        "text request to profile {} with {} messages",
        profile.name,
        messages.len()
    );

    let reply = deps
        .client
        .send(
            profile,
            &ModelRequest {
                messages,
                max_tokens: settings.max_response_token,
                provider: None,
            },
        )
        .await?;
    engine_debug!("model replied with {} chars", reply.text.len());

    let previous = match &request.continue_from {
        Some(from) if from.mode == ContinueMode::Continue => Some(prefilled_xml(&from.entry)),
        _ => None,
    };
    let mut entries = deps.extractor.extract(
        &reply.text,
        &ExtractOptions {
            previous_content: previous.as_deref(),
        },
        &deps.ids,
    )?;
    if entries.is_empty() {
        engine_warn!("reply contained no usable prompts");
        return Ok(entries);
    }

    reconcile_labels(&mut entries, &request.prior_entries);
    if request.continue_from.is_some() {
        entries.truncate(1);
    }
    engine_info!("extracted {} prompts", entries.len());
    Ok(entries)
}

pub async fn run_image_generation(
    job: &ImageGeneration,
    deps: &Collaborators,
) -> Result<ImageOutcome, GenerationError> {
    let settings = &job.settings;
    let profile = settings.image_profile()?;

    let messages = build_image_messages(
        &job.request,
        settings.image_prompt_template(),
        deps.renderer.as_ref(),
        deps.avatars.as_ref(),
    )?;
    engine_info!(
        "image {} to profile {} ({} chain images)",
        if job.request.is_refinement() {
            "refinement"
        } else {
            "request"
        },
        profile.name,
        job.request.chain_image_refs.len()
    );

    let reply = deps
        .client
        .send(
            profile,
            &ModelRequest {
                messages,
                max_tokens: settings.max_response_token,
                provider: Some(ProviderPreference {
                    allow_fallbacks: false,
                    order: settings.image_provider_order.clone(),
                }),
            },
        )
        .await?;

    if reply.image_ref.is_none() {
        engine_warn!("image model returned no image");
    }
    Ok(ImageOutcome {
        image_ref: reply.image_ref,
        text: reply.text,
    })
}
