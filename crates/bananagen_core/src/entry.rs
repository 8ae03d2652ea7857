use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    TextPrompt,
    Image,
}

/// One suggested prompt or generated image shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    /// Entry this one was derived from. Lookup only, never ownership.
    pub parent_id: Option<EntryId>,
    pub kind: EntryKind,
    pub label: String,
    pub body: String,
    /// URL or `data:` reference; only set on image entries.
    pub image_ref: Option<String>,
}

impl Entry {
    pub fn text_prompt(id: EntryId, label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            kind: EntryKind::TextPrompt,
            label: label.into(),
            body: body.into(),
            image_ref: None,
        }
    }

    /// Wraps `source` into a new image entry linked back to it.
    pub fn image_from(
        id: EntryId,
        source: &Entry,
        image_ref: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            id,
            parent_id: Some(source.id),
            kind: EntryKind::Image,
            label: label.unwrap_or_else(|| source.label.clone()),
            body: source.body.clone(),
            image_ref: Some(image_ref.into()),
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == EntryKind::Image && self.image_ref.is_some()
    }
}

/// Monotonic id source shared by the session state and the engine.
///
/// Clones hand out ids from the same counter, so ids never repeat within a
/// session.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: EntryId) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }

    pub fn next_id(&self) -> EntryId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> EntryId {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IdAllocator {
    fn eq(&self, other: &Self) -> bool {
        self.peek() == other.peek()
    }
}

impl Eq for IdAllocator {}

/// Walks `parent_id` links starting at `start`, newest first.
///
/// Stops when a parent is no longer present (dismissed) or a cycle is found.
pub fn refinement_chain(entries: &[Entry], start: EntryId) -> Vec<&Entry> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = entries.iter().find(|e| e.id == start);
    while let Some(entry) = cursor {
        if !seen.insert(entry.id) {
            break;
        }
        chain.push(entry);
        cursor = entry
            .parent_id
            .and_then(|parent| entries.iter().find(|e| e.id == parent));
    }
    chain
}
