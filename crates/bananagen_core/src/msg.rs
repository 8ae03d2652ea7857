use crate::{EntryId, GenerationFailure, ImageResult, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for new prompt suggestions.
    PromptSubmitted { prompt: String },
    /// User asked the model to keep writing an existing prompt.
    ContinueClicked { id: EntryId },
    /// User asked for a rewrite of an existing prompt.
    ReviseSubmitted { id: EntryId, instructions: String },
    /// User asked to render an entry as an image.
    GenerateImageClicked { id: EntryId, include_avatars: bool },
    /// User asked to refine a rendered image.
    RefineImageSubmitted {
        id: EntryId,
        instructions: String,
        include_avatars: bool,
    },
    DismissClicked { id: EntryId },
    PostToChatClicked { id: EntryId },
    ResetClicked,
    /// Engine finished a text generation.
    TextGenerationDone {
        request_id: RequestId,
        result: Result<Vec<crate::Entry>, GenerationFailure>,
    },
    /// Engine finished an image generation.
    ImageGenerationDone {
        request_id: RequestId,
        result: Result<ImageResult, GenerationFailure>,
    },
    /// Render tick; carries no state change.
    Tick,
    NoOp,
}
