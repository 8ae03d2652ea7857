use bananagen_core::{Entry, IdAllocator};

use crate::markup::{check_balance, merge_continuation, MarkupError};
use crate::tree::{parse_tree, XmlElement};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions<'a> {
    /// Priming prefix of a continue request, prepended to the new text.
    pub previous_content: Option<&'a str>,
}

pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        text: &str,
        options: &ExtractOptions<'_>,
        ids: &IdAllocator,
    ) -> Result<Vec<Entry>, MarkupError>;
}

/// Reads `<images><image><title/><description/></image></images>` replies.
///
/// - an `<image>` without a non-empty `<description>` is skipped
/// - repeated descriptions are joined with a blank line
/// - a missing `<title>` becomes an empty label
/// - no `<images>` root, or no `<image>` children, yields no entries
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlPromptExtractor;

impl Extractor for XmlPromptExtractor {
    fn extract(
        &self,
        text: &str,
        options: &ExtractOptions<'_>,
        ids: &IdAllocator,
    ) -> Result<Vec<Entry>, MarkupError> {
        let document = merge_continuation(text, options.previous_content);
        check_balance(&document)?;
        let roots = parse_tree(&document)?;

        let Some(images) = roots.iter().find(|el| el.name == "images") else {
            return Ok(Vec::new());
        };

        Ok(image_elements(images)
            .into_iter()
            .filter_map(|image| entry_from_image(image, ids))
            .collect())
    }
}

/// The `<image>` children of an `<images>` element, always as a sequence,
/// whether the model wrote zero, one or many.
pub fn image_elements(images: &XmlElement) -> Vec<&XmlElement> {
    images.children_named("image").collect()
}

fn entry_from_image(image: &XmlElement, ids: &IdAllocator) -> Option<Entry> {
    let descriptions: Vec<String> = image
        .children_named("description")
        .map(XmlElement::text)
        .filter(|text| !text.is_empty())
        .collect();
    if descriptions.is_empty() {
        return None;
    }

    let label = image
        .children_named("title")
        .next()
        .map(XmlElement::text)
        .unwrap_or_default();

    Some(Entry::text_prompt(ids.next_id(), label, descriptions.join("\n\n")))
}
