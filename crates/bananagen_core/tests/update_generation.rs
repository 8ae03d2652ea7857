use bananagen_core::{
    update, AppState, Effect, Entry, EntryKind, GenerationFailure, ImageResult, Msg, NoticeLevel,
};
use pretty_assertions::assert_eq;

fn request_id_of(effects: &[Effect]) -> u64 {
    match effects {
        [Effect::GenerateText(req)] => req.request_id,
        [Effect::GenerateImage(req)] => req.request_id,
        other => panic!("unexpected effects {other:?}"),
    }
}

fn submit(state: AppState) -> (AppState, u64) {
    let (state, effects) = update(
        state,
        Msg::PromptSubmitted {
            prompt: "scene".to_string(),
        },
    );
    let id = request_id_of(&effects);
    (state, id)
}

fn complete_text(state: AppState, request_id: u64, entries: Vec<Entry>) -> AppState {
    update(
        state,
        Msg::TextGenerationDone {
            request_id,
            result: Ok(entries),
        },
    )
    .0
}

#[test]
fn fresh_results_are_prepended_in_order() {
    let state = AppState::new();
    let ids = state.id_allocator();
    let (state, req) = submit(state);
    let state = complete_text(
        state,
        req,
        vec![Entry::text_prompt(ids.next_id(), "Old", "old body")],
    );
    let (state, req) = submit(state);
    let state = complete_text(
        state,
        req,
        vec![
            Entry::text_prompt(ids.next_id(), "One", "first"),
            Entry::text_prompt(ids.next_id(), "Two", "second"),
        ],
    );

    let labels: Vec<_> = state.view().entries.into_iter().map(|e| e.label).collect();
    assert_eq!(labels, vec!["One".to_string(), "Two".to_string(), "Old".to_string()]);
    assert!(!state.is_generating());
    assert_eq!(
        state.notice().map(|n| n.text.as_str()),
        Some("Added 2 new prompts.")
    );
}

#[test]
fn empty_result_warns_without_error() {
    let (state, req) = submit(AppState::new());
    let state = complete_text(state, req, Vec::new());

    let notice = state.notice().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.text, "No results from AI");
}

#[test]
fn stale_completion_is_ignored() {
    let (state, req) = submit(AppState::new());
    let state = complete_text(state, req + 10, vec![Entry::text_prompt(99, "X", "x")]);

    assert!(state.is_generating());
    assert_eq!(state.view().entry_count, 0);
}

#[test]
fn continued_entry_replaces_source_in_place_and_links_to_it() {
    let state = AppState::new();
    let ids = state.id_allocator();
    let (state, req) = submit(state);
    let state = complete_text(
        state,
        req,
        vec![
            Entry::text_prompt(ids.next_id(), "Top", "top"),
            Entry::text_prompt(ids.next_id(), "Lake", "A lake"),
        ],
    );
    let source_id = state.entries()[1].id;

    let (state, effects) = update(state, Msg::ContinueClicked { id: source_id });
    let req = request_id_of(&effects);
    let continued = Entry::text_prompt(ids.next_id(), "Lake", "A lake at dawn");
    let continued_id = continued.id;
    let extra = Entry::text_prompt(ids.next_id(), "Extra", "dropped");
    let state = complete_text(state, req, vec![continued, extra]);

    let entries = state.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].id, continued_id);
    assert_ne!(entries[1].id, source_id);
    assert_eq!(entries[1].parent_id, Some(source_id));
    assert_eq!(entries[1].body, "A lake at dawn");
    assert_eq!(state.notice().map(|n| n.text.as_str()), Some("Revised prompt."));
}

#[test]
fn retryable_failure_suggests_continuing() {
    let (state, req) = submit(AppState::new());
    let (state, _) = update(
        state,
        Msg::TextGenerationDone {
            request_id: req,
            result: Err(GenerationFailure::new(
                "incomplete XML: missing </image> tag",
                true,
            )),
        },
    );

    let notice = state.notice().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.starts_with("incomplete XML"));
    assert!(notice.text.contains("continuing"));
}

#[test]
fn image_success_adds_linked_image_entry() {
    let state = AppState::new();
    let ids = state.id_allocator();
    let (state, req) = submit(state);
    let state = complete_text(state, req, vec![Entry::text_prompt(ids.next_id(), "Lake", "A lake")]);
    let text_id = state.entries()[0].id;

    let (state, effects) = update(
        state,
        Msg::GenerateImageClicked {
            id: text_id,
            include_avatars: true,
        },
    );
    let req = match effects.as_slice() {
        [Effect::GenerateImage(req)] => req.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert!(req.include_avatars);
    assert!(!req.is_refinement());
    assert!(req.chain_image_refs.is_empty());

    let (state, _) = update(
        state,
        Msg::ImageGenerationDone {
            request_id: req.request_id,
            result: Ok(ImageResult {
                image_ref: Some("https://img.example/1.png".to_string()),
                text: "Here you go".to_string(),
            }),
        },
    );

    let image = &state.entries()[0];
    assert_eq!(image.kind, EntryKind::Image);
    assert_eq!(image.parent_id, Some(text_id));
    assert_eq!(image.label, "Lake");
    assert_eq!(image.body, "A lake");
    assert_eq!(image.image_ref.as_deref(), Some("https://img.example/1.png"));
    assert_eq!(
        state.notice().map(|n| n.text.as_str()),
        Some("Image generated successfully!\nHere you go")
    );
}

#[test]
fn refinement_sends_chain_oldest_first() {
    let state = AppState::new();
    let ids = state.id_allocator();
    let (state, req) = submit(state);
    let state = complete_text(state, req, vec![Entry::text_prompt(ids.next_id(), "Lake", "A lake")]);
    let text_id = state.entries()[0].id;

    let (state, effects) = update(
        state,
        Msg::GenerateImageClicked {
            id: text_id,
            include_avatars: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::ImageGenerationDone {
            request_id: request_id_of(&effects),
            result: Ok(ImageResult {
                image_ref: Some("first.png".to_string()),
                text: String::new(),
            }),
        },
    );
    let first_image = state.entries()[0].id;

    let (state, effects) = update(
        state,
        Msg::RefineImageSubmitted {
            id: first_image,
            instructions: "add fog".to_string(),
            include_avatars: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::ImageGenerationDone {
            request_id: request_id_of(&effects),
            result: Ok(ImageResult {
                image_ref: Some("second.png".to_string()),
                text: String::new(),
            }),
        },
    );
    let second_image = state.entries()[0].clone();
    assert_eq!(second_image.label, "Refined: add fog");
    assert_eq!(second_image.parent_id, Some(first_image));

    let (_, effects) = update(
        state,
        Msg::RefineImageSubmitted {
            id: second_image.id,
            instructions: "brighter".to_string(),
            include_avatars: false,
        },
    );
    match effects.as_slice() {
        [Effect::GenerateImage(req)] => {
            assert_eq!(
                req.chain_image_refs,
                vec!["first.png".to_string(), "second.png".to_string()]
            );
            assert_eq!(req.instruction.as_deref(), Some("brighter"));
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn missing_image_reports_failure() {
    let state = AppState::new();
    let ids = state.id_allocator();
    let (state, req) = submit(state);
    let state = complete_text(state, req, vec![Entry::text_prompt(ids.next_id(), "Lake", "A lake")]);
    let text_id = state.entries()[0].id;
    let (state, effects) = update(
        state,
        Msg::GenerateImageClicked {
            id: text_id,
            include_avatars: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::ImageGenerationDone {
            request_id: request_id_of(&effects),
            result: Ok(ImageResult::default()),
        },
    );

    assert_eq!(state.view().entry_count, 1);
    let notice = state.notice().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.text, "Image generation failed. No image was returned.");
}

#[test]
fn posting_an_image_emits_effect() {
    let source = Entry::text_prompt(1, "Lake", "A lake");
    let state = AppState::with_ids(bananagen_core::IdAllocator::starting_at(2));
    let (state, _) = submit(state);
    let (state, _) = update(
        state,
        Msg::TextGenerationDone {
            request_id: 1,
            result: Ok(vec![source]),
        },
    );
    let (state, effects) = update(
        state,
        Msg::GenerateImageClicked {
            id: 1,
            include_avatars: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::ImageGenerationDone {
            request_id: request_id_of(&effects),
            result: Ok(ImageResult {
                image_ref: Some("data:image/png;base64,AAAA".to_string()),
                text: String::new(),
            }),
        },
    );
    let image_id = state.entries()[0].id;
    assert_eq!(image_id, 2);

    let (_, effects) = update(state, Msg::PostToChatClicked { id: image_id });
    match effects.as_slice() {
        [Effect::PostToChat { entry }] => assert_eq!(entry.id, image_id),
        other => panic!("unexpected effects {other:?}"),
    }
}
