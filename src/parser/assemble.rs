//! Walks a problem document and assembles one record per response fragment

use super::extract::{extract, Fragment};
use super::label::resolve_labels;
use super::xml::MarkupDocument;
use crate::models::{
    DeclaredKinds, FragmentError, FragmentKind, ProblemContent, ProblemError, ProblemRecord,
    ResponseKind,
};
use serde::{Deserialize, Serialize};

/// Every response tag of the authoring dialect, supported or not
pub const RESPONSE_TAGS: &[&str] = &[
    "multiplechoiceresponse",
    "choiceresponse",
    "stringresponse",
    "truefalseresponse",
    "optionresponse",
    "numericalresponse",
    "formularesponse",
    "customresponse",
    "symbolicresponse",
    "coderesponse",
    "externalresponse",
    "imageresponse",
    "schematicresponse",
    "javascriptresponse",
    "annotationresponse",
    "choicetextresponse",
];

/// Input elements that receive answer ids
pub const INPUT_TAGS: &[&str] = &[
    "textline",
    "textbox",
    "choicegroup",
    "radiogroup",
    "checkboxgroup",
    "optioninput",
    "formulaequationinput",
    "schematic",
    "imageinput",
    "crystallography",
    "vsepr_input",
    "chemicalequationinput",
    "drag_and_drop_input",
    "designprotein2dinput",
    "editageneinput",
    "editamoleculeinput",
    "annotationinput",
    "choicetextgroup",
    "matlabinput",
    "jsinput",
    "filesubmission",
    "javascriptinput",
];

/// What to do with a fragment that fails extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentPolicy {
    /// The first failing fragment fails the whole document
    #[default]
    Abort,
    /// Failing fragments contribute no record
    Skip,
}

/// Per-fragment outcomes of one assembly pass, in fragment order
#[derive(Debug, Clone)]
pub struct Assembly {
    pub content_id: String,
    pub outcomes: Vec<Result<ProblemRecord, FragmentError>>,
}

impl Assembly {
    pub fn failures(&self) -> Vec<&FragmentError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err()).collect()
    }

    /// Apply `policy` and shape the surviving records
    ///
    /// `None` when no record survives, the record itself when exactly one does.
    pub fn into_content(self, policy: FragmentPolicy) -> Result<Option<ProblemContent>, ProblemError> {
        let mut records = Vec::with_capacity(self.outcomes.len());
        for outcome in self.outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(source) => match policy {
                    FragmentPolicy::Abort => {
                        return Err(ProblemError::Fragment {
                            id: self.content_id,
                            source,
                        })
                    }
                    FragmentPolicy::Skip => {
                        tracing::warn!(problem = %self.content_id, "Skipping fragment: {}", source);
                    }
                },
            }
        }

        Ok(match records.len() {
            0 => None,
            1 => records.pop().map(ProblemContent::Single),
            _ => Some(ProblemContent::Many(records)),
        })
    }
}

/// Assign ids, resolve labels and extract every fragment of `doc`
///
/// Mutates `doc`: id attributes are written and consumed label markup removed.
pub fn assemble(
    doc: &mut MarkupDocument,
    content_id: &str,
    declared: &DeclaredKinds,
    version: &str,
) -> Result<Assembly, ProblemError> {
    if let Some(kind) = declared.single() {
        if ResponseKind::from_tag(kind).is_none() {
            return Err(ProblemError::UnsupportedKind {
                id: content_id.to_string(),
                kinds: declared.to_string(),
            });
        }
    }

    let root = doc.root();
    for (index, p) in doc.children_named(root, "p").into_iter().enumerate() {
        doc.set_attr(p, "id", format!("{}_{}", content_id, index + 1));
    }
    for (index, solution) in doc.find_all(&["solution"]).into_iter().enumerate() {
        doc.set_attr(solution, "id", format!("{}_{}", content_id, index + 1));
    }

    let nodes = doc.find_all(RESPONSE_TAGS);
    let fragment_count = nodes.len();
    let mut outcomes = Vec::with_capacity(fragment_count);

    for (index, node) in nodes.into_iter().enumerate() {
        let response_number = index + 1;
        let fragment = Fragment {
            node,
            id: format!("{}_{}", content_id, response_number),
            tag: doc.tag(node).unwrap_or_default().to_string(),
        };
        doc.set_attr(node, "id", fragment.id.as_str());

        let inputs = doc.descendants_named(node, INPUT_TAGS);
        for (position, &input) in inputs.iter().enumerate() {
            let answer_number = position + 1;
            doc.set_attr(input, "response_id", response_number.to_string());
            doc.set_attr(input, "answer_id", answer_number.to_string());
            doc.set_attr(
                input,
                "id",
                format!("{}_{}_{}", content_id, response_number, answer_number),
            );
        }

        let labeling = resolve_labels(doc, node, &inputs, &fragment.id);

        let kind = match declared.single() {
            Some(kind) => FragmentKind::from_tag(kind),
            None => FragmentKind::from_tag(&fragment.tag),
        };
        tracing::debug!(fragment = %fragment.id, tag = %fragment.tag, ?kind, "Extracting fragment");

        let outcome = match kind {
            FragmentKind::Supported(kind) => extract(kind, doc, &fragment).map(|extracted| ProblemRecord {
                id: if fragment_count > 1 {
                    fragment.id.clone()
                } else {
                    content_id.to_string()
                },
                kind,
                title: labeling.title,
                options: extracted.options,
                choices: extracted.choices,
                answers: extracted.answers,
                solution: extracted.solution,
                version: version.to_string(),
                accessibility: labeling.accessibility,
            }),
            FragmentKind::Unsupported(tag) => Err(FragmentError::Unsupported {
                fragment_id: fragment.id.clone(),
                tag,
            }),
        };
        outcomes.push(outcome);
    }

    Ok(Assembly {
        content_id: content_id.to_string(),
        outcomes,
    })
}

/// Assemble `doc` and apply `policy`
pub fn get_content(
    doc: &mut MarkupDocument,
    content_id: &str,
    declared: &DeclaredKinds,
    version: &str,
    policy: FragmentPolicy,
) -> Result<Option<ProblemContent>, ProblemError> {
    assemble(doc, content_id, declared, version)?.into_content(policy)
}
