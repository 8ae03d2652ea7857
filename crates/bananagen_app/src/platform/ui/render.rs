use bananagen_core::{AppViewModel, EntryKind, EntryRowView, Notice, NoticeLevel};

const IMAGE_REF_PREVIEW: usize = 60;

pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    if view.entries.is_empty() {
        out.push_str("(no entries)\n");
    }
    for row in &view.entries {
        out.push_str(&render_row(row));
    }
    if view.generating {
        out.push_str("... generating\n");
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.text)
}

fn render_row(row: &EntryRowView) -> String {
    let kind = match row.kind {
        EntryKind::TextPrompt => "prompt",
        EntryKind::Image => "image",
    };
    let label = if row.label.is_empty() {
        "*No name*"
    } else {
        row.label.as_str()
    };

    let mut out = format!("#{} {kind}: {label}", row.id);
    if let Some(parent) = row.parent_id {
        out.push_str(&format!(" (from #{parent})"));
    }
    out.push('\n');
    for line in row.body_preview.lines() {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    if let Some(image_ref) = &row.image_ref {
        out.push_str("    image: ");
        out.push_str(&shorten(image_ref));
        out.push('\n');
    }
    out
}

/// `data:` URLs run to megabytes; show only their head.
fn shorten(image_ref: &str) -> String {
    match image_ref.char_indices().nth(IMAGE_REF_PREVIEW) {
        Some((end, _)) if image_ref.starts_with("data:") => format!("{}...", &image_ref[..end]),
        _ => image_ref.to_string(),
    }
}
