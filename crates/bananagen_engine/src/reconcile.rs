use bananagen_core::Entry;

/// Carries a known label forward onto freshly parsed entries that came back
/// without one, matching by id.
pub fn reconcile_labels(parsed: &mut [Entry], prior: &[Entry]) {
    for entry in parsed.iter_mut().filter(|e| e.label.is_empty()) {
        if let Some(known) = prior.iter().find(|p| p.id == entry.id) {
            entry.label = known.label.clone();
        }
    }
}
