//! Priming documents for continue and revise requests.

use bananagen_core::Entry;
use quick_xml::escape::escape;

/// Single-entry document that stops inside `<description>`, so the model
/// picks up mid-sentence.
pub fn prefilled_xml(entry: &Entry) -> String {
    format!(
        "\n<images>\n  <image>\n    <title>{}</title>\n    <description>{}",
        escape(entry.label.as_str()),
        escape(entry.body.as_str()),
    )
}

/// Complete single-entry document, shown to the model as its previous answer.
pub fn full_xml(entry: &Entry) -> String {
    format!(
        "{}</description>\n  </image>\n</images>",
        prefilled_xml(entry)
    )
}
