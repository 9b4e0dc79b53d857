//! Composite document detection and response-kind classification

use super::assemble::RESPONSE_TAGS;
use super::xml::MarkupDocument;
use crate::models::DeclaredKinds;

/// True when the document holds more than one instance of its declared kind
///
/// A mixed declaration is always composite. Without a declaration every
/// response tag counts.
pub fn has_multiple(doc: &MarkupDocument, declared: &DeclaredKinds) -> bool {
    match declared {
        DeclaredKinds::Mixed(_) => true,
        DeclaredKinds::Single(tag) => doc.find_all(&[tag.as_str()]).len() > 1,
        DeclaredKinds::None => doc.find_all(RESPONSE_TAGS).len() > 1,
    }
}

/// Response kinds present in the document, as a content store would declare them
pub fn classify(doc: &MarkupDocument) -> DeclaredKinds {
    DeclaredKinds::from_tags(
        doc.find_all(RESPONSE_TAGS)
            .into_iter()
            .filter_map(|node| doc.tag(node).map(str::to_string)),
    )
}
