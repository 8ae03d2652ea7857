//! BananaGen core: entry model and the pure session state machine.
mod effect;
mod entry;
mod msg;
mod preview;
mod state;
mod update;
mod view_model;

pub use effect::{ContinueFrom, ContinueMode, Effect, ImageRequest, TextRequest};
pub use entry::{refinement_chain, Entry, EntryId, EntryKind, IdAllocator};
pub use msg::Msg;
pub use preview::{prepare_preview, MAX_PREVIEW_CHARS};
pub use state::{AppState, GenerationFailure, ImageResult, Notice, NoticeLevel, RequestId};
pub use update::update;
pub use view_model::{AppViewModel, EntryRowView};
