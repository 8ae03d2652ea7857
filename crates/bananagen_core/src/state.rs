use crate::effect::ContinueMode;
use crate::entry::{Entry, EntryId, IdAllocator};
use crate::preview::prepare_preview;
use crate::view_model::{AppViewModel, EntryRowView};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One-line status message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Why a generation attempt produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub message: String,
    /// The model stopped mid-document; asking it to continue may help.
    pub retryable: bool,
}

impl GenerationFailure {
    pub fn new(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            retryable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageResult {
    pub image_ref: Option<String>,
    /// Any text the image model sent along with (or instead of) the image.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Text {
        continue_from: Option<(EntryId, ContinueMode)>,
    },
    Image {
        source: Entry,
        instruction: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pending {
    pub(crate) request_id: RequestId,
    pub(crate) kind: PendingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    /// Newest first.
    entries: Vec<Entry>,
    ids: IdAllocator,
    pending: Option<Pending>,
    next_request_id: RequestId,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session whose ids come from an existing allocator.
    pub fn with_ids(ids: IdAllocator) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    /// Handle to the session id counter, for components that create entries.
    pub fn id_allocator(&self) -> IdAllocator {
        self.ids.clone()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            entries: self
                .entries
                .iter()
                .map(|entry| EntryRowView {
                    id: entry.id,
                    parent_id: entry.parent_id,
                    kind: entry.kind,
                    label: entry.label.clone(),
                    body_preview: prepare_preview(&entry.body),
                    image_ref: entry.image_ref.clone(),
                })
                .collect(),
            entry_count: self.entries.len(),
            generating: self.is_generating(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn begin(&mut self, kind: PendingKind) -> RequestId {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.pending = Some(Pending { request_id, kind });
        self.mark_dirty();
        request_id
    }

    /// Takes the pending request if `request_id` matches it.
    pub(crate) fn finish(&mut self, request_id: RequestId) -> Option<PendingKind> {
        if self.pending.as_ref().map(|p| p.request_id) != Some(request_id) {
            return None;
        }
        self.mark_dirty();
        self.pending.take().map(|p| p.kind)
    }

    pub(crate) fn next_entry_id(&self) -> EntryId {
        self.ids.next_id()
    }

    pub(crate) fn prepend(&mut self, mut entries: Vec<Entry>) {
        if entries.is_empty() {
            return;
        }
        entries.append(&mut self.entries);
        self.entries = entries;
        self.mark_dirty();
    }

    /// Swaps the entry `id` for `replacement`, keeping its list position.
    /// Falls back to prepending when `id` was dismissed meanwhile.
    pub(crate) fn replace(&mut self, id: EntryId, replacement: Entry) {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(slot) => *slot = replacement,
            None => self.entries.insert(0, replacement),
        }
        self.mark_dirty();
    }

    pub(crate) fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.notice = None;
        self.mark_dirty();
    }
}
