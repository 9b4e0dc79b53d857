//! Question title and accessibility label recovery

use super::xml::{MarkupDocument, NodeId};
use crate::models::{Accessibility, InputMeta};

/// Input types that render their own label; consumed label markup is
/// removed for these so the question text is not shown twice
pub const ACCESSIBLE_INPUT_TYPES: &[&str] = &[
    "checkboxgroup",
    "radiogroup",
    "choicegroup",
    "optioninput",
    "textline",
    "formulaequationinput",
    "textbox",
];

/// Title and accessibility data of one fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labeling {
    pub title: String,
    pub accessibility: Accessibility,
}

/// Resolve the title of a response and collect its accessibility data
///
/// `inputs` are the input elements of the response with ids already assigned.
pub fn resolve_labels(
    doc: &mut MarkupDocument,
    response: NodeId,
    inputs: &[NodeId],
    fragment_id: &str,
) -> Labeling {
    match inputs {
        [] => Labeling::default(),
        [input] => resolve_single(doc, response, *input),
        _ => resolve_multiple(doc, response, inputs, fragment_id),
    }
}

fn resolve_single(doc: &mut MarkupDocument, response: NodeId, input: NodeId) -> Labeling {
    let (title, consumed) = match find_title(doc, response, input) {
        Some((title, node)) => (title, Some(node)),
        None => (String::new(), None),
    };

    let accessible = doc
        .tag(input)
        .is_some_and(|tag| ACCESSIBLE_INPUT_TYPES.contains(&tag));
    if let Some(node) = consumed.filter(|_| accessible) {
        doc.detach(node);
    }

    let input_id = doc.attr(input, "id").unwrap_or_default().to_string();
    let mut accessibility = Accessibility::default();
    for (index, description) in doc.children_named(response, "description").into_iter().enumerate() {
        let key = format!("description_{}_{}", input_id, index + 1);
        accessibility
            .descriptions
            .insert(key, doc.inner_xml(description).trim().to_string());
        doc.detach(description);
    }
    accessibility.inputs.push(input_meta(doc, input, None));

    Labeling {
        title,
        accessibility,
    }
}

/// Title precedence, first match wins:
/// 1. `<label>` child of the response
/// 2. the preceding `<p>` when its text equals the input's `label` attribute
/// 3. a `<label>` immediately preceding the response
fn find_title(doc: &MarkupDocument, response: NodeId, input: NodeId) -> Option<(String, NodeId)> {
    if let Some(label) = doc.find_child(response, "label") {
        return Some((stringify(doc, label), label));
    }

    let previous = doc.preceding_element(response);

    if let Some(label_attr) = doc.attr(input, "label") {
        if let Some(p) = previous.filter(|&node| doc.is_tag(node, "p")) {
            if doc.text(p) == Some(label_attr) {
                return Some((stringify(doc, p), p));
            }
        }
    }

    previous
        .filter(|&node| doc.is_tag(node, "label"))
        .map(|label| (stringify(doc, label), label))
}

fn resolve_multiple(
    doc: &mut MarkupDocument,
    response: NodeId,
    inputs: &[NodeId],
    fragment_id: &str,
) -> Labeling {
    doc.set_attr(response, "multiple_inputtypes", "true");

    let mut group_label = None;
    if let Some(label) = doc.find_child(response, "label") {
        let label_id = format!("multiinput-group-label-{}", fragment_id);
        group_label = Some(stringify(doc, label));
        doc.set_tag(label, "p");
        doc.set_attr(label, "id", label_id.as_str());
        doc.set_attr(label, "class", "multi-inputs-group-label");
        doc.set_attr(response, "multiinput-group-label-id", label_id);
    }

    let mut description_ids = Vec::new();
    for (index, description) in doc.children_named(response, "description").into_iter().enumerate() {
        let description_id = format!("multiinput-group-description-{}-{}", fragment_id, index);
        doc.set_tag(description, "p");
        doc.set_attr(description, "id", description_id.as_str());
        doc.set_attr(
            description,
            "class",
            "multi-inputs-group-description question-description",
        );
        description_ids.push(description_id);
    }
    if !description_ids.is_empty() {
        doc.set_attr(
            response,
            "multiinput-group_description_ids",
            description_ids.join(" "),
        );
    }

    let group_label = group_label.unwrap_or_default();
    let metas: Vec<InputMeta> = inputs
        .iter()
        .map(|&input| input_meta(doc, input, Some(group_label.clone())))
        .collect();
    let title = metas
        .last()
        .and_then(|meta| meta.label.clone())
        .unwrap_or_default();

    Labeling {
        title,
        accessibility: Accessibility {
            group_label: Some(group_label),
            descriptions: Default::default(),
            inputs: metas,
        },
    }
}

fn input_meta(doc: &MarkupDocument, input: NodeId, group_label: Option<String>) -> InputMeta {
    InputMeta {
        id: doc.attr(input, "id").unwrap_or_default().to_string(),
        tag: doc.tag(input).unwrap_or_default().to_string(),
        label: doc.attr(input, "label").map(str::to_string),
        group_label,
    }
}

fn stringify(doc: &MarkupDocument, node: NodeId) -> String {
    doc.inner_xml(node).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(markup: &str) -> (MarkupDocument, NodeId, Vec<NodeId>) {
        let mut doc = MarkupDocument::parse(markup).unwrap();
        let response = doc.find_all(&["stringresponse", "choiceresponse"])[0];
        let inputs = doc.descendants_named(response, &["textline", "checkboxgroup", "customtext"]);
        for (index, &input) in inputs.iter().enumerate() {
            doc.set_attr(input, "id", format!("p_1_{}", index + 1));
        }
        (doc, response, inputs)
    }

    #[test]
    fn test_label_child_wins() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><label>Outer</label><stringresponse answer="a"><label>Inner <b>q</b></label><textline label="x"/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");
        assert_eq!(labeling.title, "Inner <b>q</b>");
        assert!(doc.find_all(&["b"]).is_empty());
        assert_eq!(doc.find_all(&["label"]).len(), 1);
    }

    #[test]
    fn test_paragraph_matching_label_attribute() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><p>What is 2+2?</p><stringresponse answer="4"><textline label="What is 2+2?"/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");
        assert_eq!(labeling.title, "What is 2+2?");
        assert!(doc.find_all(&["p"]).is_empty());
    }

    #[test]
    fn test_mismatched_paragraph_falls_through() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><p>Something else</p><stringresponse answer="4"><textline label="What is 2+2?"/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");
        assert_eq!(labeling.title, "");
        assert_eq!(doc.find_all(&["p"]).len(), 1);
    }

    #[test]
    fn test_preceding_label_consumed_for_accessible_input() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><label>Q1</label><stringresponse answer="a"><textline/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");
        assert_eq!(labeling.title, "Q1");
        assert!(doc.find_all(&["label"]).is_empty());
    }

    #[test]
    fn test_preceding_label_kept_for_other_inputs() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><label>Q1</label><stringresponse answer="a"><customtext/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");
        assert_eq!(labeling.title, "Q1");
        assert_eq!(doc.find_all(&["label"]).len(), 1);
    }

    #[test]
    fn test_descriptions_collected_in_order() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><stringresponse answer="a"><label>Q</label><description>First</description><description>Second</description><textline/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");
        let descriptions: Vec<(&String, &String)> = labeling.accessibility.descriptions.iter().collect();
        assert_eq!(descriptions.len(), 2);
        assert_eq!(descriptions[0].0, "description_p_1_1_1");
        assert_eq!(descriptions[0].1, "First");
        assert_eq!(descriptions[1].0, "description_p_1_1_2");
        assert!(doc.find_all(&["description"]).is_empty());
    }

    #[test]
    fn test_no_inputs_no_labeling() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><label>Q1</label><stringresponse answer="a"/></problem>"#,
        );
        assert_eq!(resolve_labels(&mut doc, response, &inputs, "p_1"), Labeling::default());
        assert_eq!(doc.find_all(&["label"]).len(), 1);
    }

    #[test]
    fn test_multi_input_group_label() {
        let (mut doc, response, inputs) = setup(
            r#"<problem><stringresponse answer="a"><label>Fill both</label><description>Hint</description><textline label="first"/><textline label="second"/></stringresponse></problem>"#,
        );
        let labeling = resolve_labels(&mut doc, response, &inputs, "p_1");

        assert_eq!(labeling.title, "second");
        assert_eq!(labeling.accessibility.group_label.as_deref(), Some("Fill both"));
        assert!(labeling.accessibility.descriptions.is_empty());
        assert_eq!(labeling.accessibility.inputs.len(), 2);
        assert!(labeling
            .accessibility
            .inputs
            .iter()
            .all(|meta| meta.group_label.as_deref() == Some("Fill both")));

        assert_eq!(doc.attr(response, "multiple_inputtypes"), Some("true"));
        assert_eq!(
            doc.attr(response, "multiinput-group-label-id"),
            Some("multiinput-group-label-p_1")
        );
        assert_eq!(
            doc.attr(response, "multiinput-group_description_ids"),
            Some("multiinput-group-description-p_1-0")
        );
        assert!(doc.find_all(&["label", "description"]).is_empty());
    }
}
