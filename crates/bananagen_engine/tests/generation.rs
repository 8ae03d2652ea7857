use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use bananagen_core::{
    ContinueFrom, ContinueMode, Entry, IdAllocator, ImageRequest, ImageResult, TextRequest,
};
use bananagen_engine::{
    run_image_generation, run_text_generation, Collaborators, ConnectionProfile, EngineEvent,
    EngineHandle, ExtensionSettings, FileAvatarSource, GenerationError, HandlebarsRenderer,
    ImageGeneration, ModelClient, ModelReply, ModelRequest, RequestError, SettingsError,
    TextGeneration, TranscriptContext, XmlPromptExtractor,
};
use pretty_assertions::assert_eq;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<ModelReply>>,
    seen: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    fn replying(texts: &[&str]) -> Arc<Self> {
        let client = Self::default();
        client.replies.lock().unwrap().extend(texts.iter().map(|t| ModelReply {
            text: t.to_string(),
            image_ref: None,
        }));
        Arc::new(client)
    }

    fn with_reply(reply: ModelReply) -> Arc<Self> {
        let client = Self::default();
        client.replies.lock().unwrap().push_back(reply);
        Arc::new(client)
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelClient for ScriptedClient {
    async fn send(
        &self,
        _profile: &ConnectionProfile,
        request: &ModelRequest,
    ) -> Result<ModelReply, RequestError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
    }
}

fn settings() -> ExtensionSettings {
    let mut settings = ExtensionSettings::default();
    settings.profiles.push(ConnectionProfile {
        id: "text".to_string(),
        name: "Text".to_string(),
        base_url: "http://localhost:1/v1".to_string(),
        model: "writer".to_string(),
        context_size: Some(20000),
        api_key_env: None,
    });
    settings.profiles.push(ConnectionProfile {
        id: "img".to_string(),
        name: "Image".to_string(),
        base_url: "http://localhost:1/v1".to_string(),
        model: "painter".to_string(),
        context_size: None,
        api_key_env: None,
    });
    settings.profile_id = "text".to_string();
    settings.image_profile_id = "img".to_string();
    settings
}

fn deps(client: Arc<ScriptedClient>, ids: IdAllocator) -> Collaborators {
    Collaborators {
        client,
        renderer: Arc::new(HandlebarsRenderer::new()),
        chat: Arc::new(TranscriptContext::empty()),
        avatars: Arc::new(FileAvatarSource::default()),
        extractor: Arc::new(XmlPromptExtractor),
        ids,
    }
}

fn text_job(prompt: &str, prior: Vec<Entry>, continue_from: Option<ContinueFrom>) -> TextGeneration {
    TextGeneration {
        request: TextRequest {
            request_id: 1,
            user_prompt: prompt.to_string(),
            prior_entries: prior,
            continue_from,
        },
        settings: settings(),
    }
}

const TWO_PROMPTS: &str = "```xml
<images>
  <image><title>Ford</title><description>Riders at the ford.</description></image>
  <image><title>Bridge</title><description>A broken bridge.</description></image>
</images>
```";

#[tokio::test]
async fn fresh_generation_returns_all_prompts() {
    init_logging();
    let client = ScriptedClient::replying(&[TWO_PROMPTS]);
    let entries = run_text_generation(
        &text_job("the river", Vec::new(), None),
        &deps(client.clone(), IdAllocator::starting_at(10)),
    )
    .await
    .unwrap();

    assert_eq!(
        entries.iter().map(|e| (e.id, e.label.as_str())).collect::<Vec<_>>(),
        vec![(10, "Ford"), (11, "Bridge")]
    );
    let sent = client.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].max_tokens, 8192);
    assert!(sent[0].provider.is_none());
}

#[tokio::test]
async fn continue_merges_with_prefilled_document_and_keeps_one() {
    init_logging();
    let source = Entry::text_prompt(4, "Ford", "Riders reach");
    let client = ScriptedClient::replying(&[
        " the ford at dusk.</description>\n  </image>\n  <image><description>extra</description></image>\n</images>",
    ]);
    let entries = run_text_generation(
        &text_job(
            "",
            vec![source.clone()],
            Some(ContinueFrom {
                entry: source,
                mode: ContinueMode::Continue,
            }),
        ),
        &deps(client, IdAllocator::starting_at(20)),
    )
    .await
    .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "Ford");
    assert_eq!(entries[0].body, "Riders reach the ford at dusk.");
}

#[tokio::test]
async fn reply_cut_off_mid_document_is_retryable() {
    init_logging();
    let client = ScriptedClient::replying(&["<images><image><title>T</title><description>half"]);
    let err = run_text_generation(&text_job("x", Vec::new(), None), &deps(client, IdAllocator::new()))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_failure().retryable);
}

#[tokio::test]
async fn invalid_reply_is_not_retryable() {
    init_logging();
    let client = ScriptedClient::replying(&["<images><image><description>a</description></image></nope>"]);
    let err = run_text_generation(&text_job("x", Vec::new(), None), &deps(client, IdAllocator::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Markup(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn missing_profile_fails_without_calling_model() {
    init_logging();
    let client = ScriptedClient::replying(&[TWO_PROMPTS]);
    let mut job = text_job("x", Vec::new(), None);
    job.settings.profile_id.clear();
    let err = run_text_generation(&job, &deps(client.clone(), IdAllocator::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::Settings(SettingsError::NoProfileSelected)
    ));
    assert_eq!(err.to_string(), "No connection profile selected.");
    assert!(client.requests().is_empty());
}

fn image_job() -> ImageGeneration {
    ImageGeneration {
        request: ImageRequest {
            request_id: 2,
            source: Entry::text_prompt(3, "Ford", "Riders at the ford."),
            chain_image_refs: Vec::new(),
            instruction: None,
            include_avatars: true,
        },
        settings: settings(),
    }
}

#[tokio::test]
async fn image_generation_pins_provider_order() {
    init_logging();
    let client = ScriptedClient::with_reply(ModelReply {
        text: "Here is your image".to_string(),
        image_ref: Some("https://cdn/img.png".to_string()),
    });
    let outcome = run_image_generation(&image_job(), &deps(client.clone(), IdAllocator::new()))
        .await
        .unwrap();
    assert_eq!(outcome.image_ref.as_deref(), Some("https://cdn/img.png"));
    assert_eq!(outcome.text, "Here is your image");

    let provider = client.requests()[0].provider.clone().unwrap();
    assert!(!provider.allow_fallbacks);
    assert_eq!(provider.order, vec!["Google".to_string()]);
}

fn wait_for_event(handle: &EngineHandle) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = handle.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "engine did not answer in time");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn engine_handle_runs_jobs_in_background() {
    init_logging();
    let client = ScriptedClient::replying(&[TWO_PROMPTS]);
    client.replies.lock().unwrap().push_back(ModelReply {
        text: String::new(),
        image_ref: Some("data:image/png;base64,AA".to_string()),
    });
    let handle = EngineHandle::new(deps(client, IdAllocator::starting_at(1)));

    handle.submit_text(text_job("river", Vec::new(), None));
    match wait_for_event(&handle) {
        EngineEvent::TextCompleted { request_id, result } => {
            assert_eq!(request_id, 1);
            assert_eq!(result.unwrap().len(), 2);
        }
        other => panic!("unexpected event {other:?}"),
    }

    handle.submit_image(image_job());
    match wait_for_event(&handle) {
        EngineEvent::ImageCompleted { request_id, result } => {
            assert_eq!(request_id, 2);
            assert_eq!(
                result.unwrap(),
                ImageResult {
                    image_ref: Some("data:image/png;base64,AA".to_string()),
                    text: String::new(),
                }
            );
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn engine_handle_reports_failures_as_messages() {
    init_logging();
    let handle = EngineHandle::new(deps(ScriptedClient::replying(&[]), IdAllocator::new()));
    let mut job = text_job("x", Vec::new(), None);
    job.settings.profile_id = "ghost".to_string();
    handle.submit_text(job);

    match wait_for_event(&handle) {
        EngineEvent::TextCompleted { result, .. } => {
            let failure = result.unwrap_err();
            assert_eq!(
                failure.message,
                "Connection profile with ID \"ghost\" not found."
            );
            assert!(!failure.retryable);
        }
        other => panic!("unexpected event {other:?}"),
    }
}
