use bananagen_core::{Entry, IdAllocator};
use bananagen_engine::{
    full_xml, prefilled_xml, reconcile_labels, ExtractOptions, Extractor, MarkupError,
    XmlPromptExtractor,
};
use pretty_assertions::assert_eq;

fn extract(text: &str) -> Result<Vec<Entry>, MarkupError> {
    XmlPromptExtractor.extract(text, &ExtractOptions::default(), &IdAllocator::new())
}

fn bodies(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.body.as_str()).collect()
}

#[test]
fn yields_one_entry_per_image_in_order() {
    let doc = "<images>\
        <image><title>One</title><description>first</description></image>\
        <image><title>Two</title><description>second</description></image>\
        <image><title>Three</title><description>third</description></image>\
        </images>";
    let entries = extract(doc).unwrap();
    assert_eq!(bodies(&entries), vec!["first", "second", "third"]);
    assert_eq!(
        entries.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(),
        vec!["One", "Two", "Three"]
    );
}

#[test]
fn single_image_is_still_a_sequence() {
    let entries = extract("<images><image><description>alone</description></image></images>")
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "");
}

#[test]
fn image_without_description_is_skipped() {
    let doc = "<images>\
        <image><title>Only a title</title></image>\
        <image><title>Blank</title><description>   </description></image>\
        <image><title>Kept</title><description>body</description></image>\
        </images>";
    let entries = extract(doc).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "Kept");
}

#[test]
fn repeated_descriptions_are_joined_with_blank_line() {
    let doc = "<images><image><description>A</description><description>B</description></image></images>";
    let entries = extract(doc).unwrap();
    assert_eq!(bodies(&entries), vec!["A\n\nB"]);
}

#[test]
fn fenced_document_parses_like_plain_one() {
    let plain = "<images><image><title>T</title><description>D</description></image></images>";
    let fenced = format!("Here you go:\n```xml\n{plain}\n```\n");
    let a = extract(plain).unwrap();
    let b = extract(&fenced).unwrap();
    assert_eq!(
        (a[0].label.clone(), a[0].body.clone()),
        (b[0].label.clone(), b[0].body.clone())
    );
}

#[test]
fn continuation_is_merged_with_previous_text() {
    let previous = "<images>\n<image>\n<title>T</title>\n<description>Hello";
    let entries = XmlPromptExtractor
        .extract(
            " world</description></image></images>",
            &ExtractOptions {
                previous_content: Some(previous),
            },
            &IdAllocator::new(),
        )
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "T");
    assert_eq!(entries[0].body, "Hello world");
}

#[test]
fn continuing_prose_with_ampersands_keeps_them_plain() {
    let entry = Entry::text_prompt(1, "Meal", "Fish & chips");
    let previous = prefilled_xml(&entry);
    let entries = XmlPromptExtractor
        .extract(
            " with salt & pepper</description></image></images>",
            &ExtractOptions {
                previous_content: Some(&previous),
            },
            &IdAllocator::new(),
        )
        .unwrap();
    assert_eq!(entries[0].label, "Meal");
    assert_eq!(entries[0].body, "Fish & chips with salt & pepper");

    // A second continue starts from the decoded body, so nothing compounds.
    let again = prefilled_xml(&entries[0]);
    let entries = XmlPromptExtractor
        .extract(
            " & vinegar</description></image></images>",
            &ExtractOptions {
                previous_content: Some(&again),
            },
            &IdAllocator::new(),
        )
        .unwrap();
    assert_eq!(entries[0].body, "Fish & chips with salt & pepper & vinegar");
}

#[test]
fn unclosed_image_is_incomplete() {
    let err = extract("<images><image><title>T</title><description>D</description>").unwrap_err();
    assert_eq!(err, MarkupError::UnclosedImage);
    assert!(err.is_incomplete());
}

#[test]
fn unclosed_description_is_incomplete() {
    let err = extract("<images><description>running on").unwrap_err();
    assert_eq!(err, MarkupError::UnclosedDescription);
}

#[test]
fn broken_markup_is_invalid_xml() {
    let doc = "<images><image><title>T</title><description>D</description></image></wrong>";
    let err = extract(doc).unwrap_err();
    assert!(matches!(err, MarkupError::InvalidXml(_)));
    assert!(!err.is_incomplete());
}

#[test]
fn empty_root_or_missing_root_yields_nothing() {
    assert!(extract("<images></images>").unwrap().is_empty());
    assert!(extract("<images/>").unwrap().is_empty());
    assert!(extract("<other><image><description>x</description></image></other>")
        .unwrap()
        .is_empty());
    assert!(extract("I cannot help with that.").unwrap().is_empty());
}

#[test]
fn full_xml_round_trips_including_special_characters() {
    let original = Entry::text_prompt(9, "Fish & <Chips>", "A \"quoted\" plate, 3 > 2 & 1 < 2");
    let entries = extract(&full_xml(&original)).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, original.label);
    assert_eq!(entries[0].body, original.body);
}

#[test]
fn ids_come_from_shared_allocator() {
    let ids = IdAllocator::starting_at(40);
    let doc = "<images>\
        <image><title>no body</title></image>\
        <image><description>a</description></image>\
        <image><description>b</description></image>\
        </images>";
    let entries = XmlPromptExtractor
        .extract(doc, &ExtractOptions::default(), &ids)
        .unwrap();
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![40, 41]);
    assert_eq!(ids.peek(), 42);
}

#[test]
fn reconciliation_copies_label_only_for_matching_id() {
    let prior = vec![Entry::text_prompt(5, "Foo", "old body")];

    let mut same = vec![Entry::text_prompt(5, "", "new body")];
    reconcile_labels(&mut same, &prior);
    assert_eq!(same[0].label, "Foo");

    let mut other = vec![Entry::text_prompt(6, "", "new body")];
    reconcile_labels(&mut other, &prior);
    assert_eq!(other[0].label, "");

    let mut labelled = vec![Entry::text_prompt(5, "Bar", "new body")];
    reconcile_labels(&mut labelled, &prior);
    assert_eq!(labelled[0].label, "Bar");
}
