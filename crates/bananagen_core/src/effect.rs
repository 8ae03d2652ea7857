use crate::{Entry, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    GenerateText(TextRequest),
    GenerateImage(ImageRequest),
    PostToChat { entry: Entry },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueMode {
    /// Prime the model with an unterminated document and let it keep going.
    Continue,
    /// Show the model the finished document and ask for a replacement.
    Revise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinueFrom {
    pub entry: Entry,
    pub mode: ContinueMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub request_id: RequestId,
    pub user_prompt: String,
    /// Entries on screen when the request was made, for templating and label
    /// reconciliation.
    pub prior_entries: Vec<Entry>,
    pub continue_from: Option<ContinueFrom>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub request_id: RequestId,
    pub source: Entry,
    /// Image references along the refinement chain, oldest first.
    pub chain_image_refs: Vec<String>,
    /// Set for refinements.
    pub instruction: Option<String>,
    pub include_avatars: bool,
}

impl ImageRequest {
    pub fn is_refinement(&self) -> bool {
        self.instruction.is_some()
    }
}
