use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::settings::ConnectionProfile;
use crate::types::ChatMessage;

#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Provider routing for OpenRouter-style endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderPreference {
    pub allow_fallbacks: bool,
    pub order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub provider: Option<ProviderPreference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelReply {
    pub text: String,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    MissingApiKey,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Sends a role-tagged message list to a connection profile.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    async fn send(
        &self,
        profile: &ConnectionProfile,
        request: &ModelRequest,
    ) -> Result<ModelReply, RequestError>;
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a ProviderPreference>,
}

/// OpenAI-compatible `chat/completions` client.
#[derive(Debug, Clone)]
pub struct ReqwestModelClient {
    client: reqwest::Client,
}

impl ReqwestModelClient {
    pub fn new(settings: RequestSettings) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| RequestError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client })
    }
}

fn endpoint(base_url: &str) -> Result<url::Url, RequestError> {
    let joined = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    url::Url::parse(&joined).map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn api_key(profile: &ConnectionProfile) -> Result<Option<String>, RequestError> {
    let Some(var) = profile.api_key_env.as_deref().filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    std::env::var(var).map(Some).map_err(|_| {
        RequestError::new(
            FailureKind::MissingApiKey,
            format!("environment variable {var} is not set"),
        )
    })
}

#[async_trait::async_trait]
impl ModelClient for ReqwestModelClient {
    async fn send(
        &self,
        profile: &ConnectionProfile,
        request: &ModelRequest,
    ) -> Result<ModelReply, RequestError> {
        let url = endpoint(&profile.base_url)?;
        let body = serde_json::to_vec(&CompletionBody {
            model: &profile.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            provider: request.provider.as_ref(),
        })
        .map_err(|err| RequestError::new(FailureKind::MalformedResponse, err.to_string()))?;

        let mut builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = api_key(profile)? {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        engine_logging::engine_debug!(
            "POST {} model={} messages={}",
            profile.base_url,
            profile.model,
            request.messages.len()
        );
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RequestError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("{status} {}", detail.trim()),
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|err| RequestError::new(FailureKind::MalformedResponse, err.to_string()))?;
        parse_reply(&value)
    }
}

/// Pulls the text and first image out of a chat-completions response.
pub fn parse_reply(value: &Value) -> Result<ModelReply, RequestError> {
    let message = value
        .pointer("/choices/0/message")
        .ok_or_else(|| RequestError::new(FailureKind::MalformedResponse, "response has no choices"))?;

    let text = match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        // Some providers send content as a list of parts.
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    };
    let image_ref = message
        .pointer("/images/0/image_url/url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    Ok(ModelReply { text, image_ref })
}

fn map_reqwest_error(err: reqwest::Error) -> RequestError {
    if err.is_timeout() {
        return RequestError::new(FailureKind::Timeout, err.to_string());
    }
    RequestError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_with_image() {
        let reply = parse_reply(&json!({
            "choices": [{ "message": {
                "content": "here you go",
                "images": [{ "image_url": { "url": "data:image/png;base64,AA" } }]
            }}]
        }))
        .unwrap();
        assert_eq!(reply.text, "here you go");
        assert_eq!(reply.image_ref.as_deref(), Some("data:image/png;base64,AA"));
    }

    #[test]
    fn reply_without_choices_is_malformed() {
        let err = parse_reply(&json!({ "error": "nope" })).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedResponse);
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(
            endpoint("https://api.example.com/v1/").unwrap().as_str(),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(endpoint("not a url").unwrap_err().kind, FailureKind::InvalidUrl);
    }
}
