use bananagen_core::EntryId;

/// Filesystem-safe name for an exported image: `{id}-{label}.{ext}`.
pub fn image_filename(id: EntryId, label: &str, ext: &str) -> String {
    format!("{id}-{}.{ext}", sanitize_title(label))
}

fn sanitize_title(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| {
            if is_forbidden(c) || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "image".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name = compacted;
    if final_name.len() > 60 {
        let mut cut = 60;
        while !final_name.is_char_boundary(cut) {
            cut -= 1;
        }
        final_name.truncate(cut);
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_label() {
        assert_eq!(
            image_filename(7, "Refined: a <cat>/dog?", "png"),
            "7-Refined_a_cat_dog.png"
        );
        assert_eq!(image_filename(3, "  ", "jpg"), "3-image.jpg");
        assert_eq!(image_filename(4, "con", "png"), "4-con_.png");
    }

    #[test]
    fn long_labels_are_cut_on_char_boundary() {
        let name = image_filename(1, &"é".repeat(50), "png");
        assert!(name.len() <= "1-".len() + 60 + ".png".len());
    }
}
