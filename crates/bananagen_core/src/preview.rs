const TRUNCATED_MARKER: &str = " [...]";
pub const MAX_PREVIEW_CHARS: usize = 400;

/// Shortens an entry body for list display, cutting on a char boundary.
pub fn prepare_preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_PREVIEW_CHARS) {
        None => trimmed.to_string(),
        Some((end, _)) => format!("{}{TRUNCATED_MARKER}", trimmed[..end].trim_end()),
    }
}
