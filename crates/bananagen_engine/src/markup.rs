//! Reassembly of model output into one document, plus the completeness check
//! that runs before any parsing.

const DESCRIPTION_CLOSE: &str = "</description>";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("Incomplete XML: Missing </image> tag")]
    UnclosedImage,
    #[error("Incomplete XML: Missing </description> tag")]
    UnclosedDescription,
    #[error("Model response is not valid XML: {0}")]
    InvalidXml(String),
}

impl MarkupError {
    /// The document stopped early; more continuation text may complete it.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::UnclosedImage | Self::UnclosedDescription)
    }
}

/// Removes ```` ```xml ```` and ```` ``` ```` fence markers wherever they occur.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```xml", "").replace("```", "")
}

/// Joins the priming prefix of a continue request with the model's new text.
///
/// Only `new_text` is fence-stripped; `previous` was generated locally.
pub fn merge_continuation(new_text: &str, previous: Option<&str>) -> String {
    let stripped = strip_code_fences(new_text);
    match previous {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}{}", stripped.trim_end()),
        _ => stripped,
    }
}

/// Shallow tag scan that rejects documents with an `<image>` or
/// `<description>` left open.
///
/// Inside an open description only `</description>` is recognised, so
/// tag-like text in prose does not disturb the counts. `<images>` and
/// `<title>` are not tracked.
pub fn check_balance(document: &str) -> Result<(), MarkupError> {
    let mut open_images = 0usize;
    let mut in_description = false;
    let mut rest = document;

    loop {
        if in_description {
            match rest.find(DESCRIPTION_CLOSE) {
                Some(idx) => {
                    rest = &rest[idx + DESCRIPTION_CLOSE.len()..];
                    in_description = false;
                    continue;
                }
                None => break,
            }
        }

        let Some(start) = rest.find('<') else { break };
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else { break };
        let tag = &after[..end];
        rest = &after[end + 1..];

        let (closing, body) = match tag.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, tag),
        };
        if !closing && body.ends_with('/') {
            continue;
        }
        let name = body
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();

        match (closing, name) {
            (false, "image") => open_images += 1,
            (true, "image") => open_images = open_images.saturating_sub(1),
            (false, "description") => in_description = true,
            _ => {}
        }
    }

    if open_images > 0 {
        Err(MarkupError::UnclosedImage)
    } else if in_description {
        Err(MarkupError::UnclosedDescription)
    } else {
        Ok(())
    }
}
