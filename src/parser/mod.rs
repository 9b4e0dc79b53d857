//! Problem markup parsing
//!
//! Raw markup goes through [`normalize`] into one canonical shape, then
//! [`assemble`] walks the tree and dispatches every response fragment to
//! its extractor.

pub mod assemble;
pub mod extract;
pub mod label;
pub mod multiplicity;
pub mod normalize;
pub mod xml;

pub use assemble::{assemble, get_content, Assembly, FragmentPolicy, INPUT_TAGS, RESPONSE_TAGS};
pub use extract::{extract, Extracted, Fragment, MatchMode};
pub use label::{resolve_labels, Labeling, ACCESSIBLE_INPUT_TYPES};
pub use multiplicity::{classify, has_multiple};
pub use normalize::{
    legacy_text_blocks, normalize, rewrite_legacy_text, MarkupGeneration, NormalizeReport,
};
pub use xml::{MarkupDocument, NodeId};

use crate::models::{DeclaredKinds, MarkupError, ProblemContent, ProblemError};

/// Parse raw markup and bring it into canonical form
pub fn load(markup: &str) -> Result<(MarkupDocument, NormalizeReport), MarkupError> {
    let mut doc = MarkupDocument::parse(&rewrite_legacy_text(markup))?;
    let report = NormalizeReport {
        text_blocks: legacy_text_blocks(markup),
        ..normalize(&mut doc)
    };
    Ok((doc, report))
}

/// Extract the problem records of one document
///
/// `content_id` names the document; fragment ids are derived from it.
pub fn parse(
    markup: &str,
    declared: &DeclaredKinds,
    version: &str,
    content_id: &str,
    policy: FragmentPolicy,
) -> Result<Option<ProblemContent>, ProblemError> {
    let (mut doc, report) = load(markup).map_err(|source| ProblemError::Markup {
        id: content_id.to_string(),
        source,
    })?;
    tracing::debug!(
        problem = %content_id,
        generation = ?report.generation(),
        rewrites = report.rewrites(),
        "Normalized markup"
    );
    get_content(&mut doc, content_id, declared, version, policy)
}

/// [`has_multiple`] over raw markup
pub fn has_multiple_markup(markup: &str, declared: &DeclaredKinds) -> Result<bool, MarkupError> {
    let (doc, _) = load(markup)?;
    Ok(has_multiple(&doc, declared))
}

/// [`classify`] over raw markup
pub fn classify_markup(markup: &str) -> Result<DeclaredKinds, MarkupError> {
    let (doc, _) = load(markup)?;
    Ok(classify(&doc))
}
