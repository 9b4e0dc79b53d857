//! Per-kind answer extraction from canonical markup

use super::assemble::RESPONSE_TAGS;
use super::xml::{MarkupDocument, NodeId};
use crate::models::{AnswerSpec, Choice, FragmentError, ResponseKind, StringAnswer};
use regex::Regex;
use std::sync::LazyLock;

/// Separator of the legacy `answer="a_or_b"` string-match shorthand
static OR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_or_").expect("valid separator pattern"));

/// Weight of a partially correct choice without an explicit `point_value`
pub const DEFAULT_PARTIAL_CREDIT: f64 = 0.5;

/// Elements whose text is feedback, not part of a choice's display text
const CHOICE_FEEDBACK_TAGS: &[&str] = &["choicehint", "hint"];

/// A located response fragment
#[derive(Debug, Clone)]
pub struct Fragment {
    pub node: NodeId,
    pub id: String,
    pub tag: String,
}

/// Kind-specific part of a problem record
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub options: Option<Vec<String>>,
    pub choices: Option<Vec<Choice>>,
    pub answers: AnswerSpec,
    pub solution: String,
}

/// Extract answers and solution of a fragment as `kind`
pub fn extract(
    kind: ResponseKind,
    doc: &mut MarkupDocument,
    fragment: &Fragment,
) -> Result<Extracted, FragmentError> {
    let mut extracted = match kind {
        ResponseKind::MultipleChoice | ResponseKind::Checkbox => extract_choices(kind, doc, fragment)?,
        ResponseKind::StringMatch => extract_string_match(doc, fragment)?,
    };
    extracted.solution = solution_text(doc, fragment);
    Ok(extracted)
}

fn malformed(kind: ResponseKind, fragment: &Fragment, reason: impl Into<String>) -> FragmentError {
    FragmentError::Malformed {
        fragment_id: fragment.id.clone(),
        kind,
        reason: reason.into(),
    }
}

fn extract_choices(
    kind: ResponseKind,
    doc: &mut MarkupDocument,
    fragment: &Fragment,
) -> Result<Extracted, FragmentError> {
    match kind {
        ResponseKind::MultipleChoice => name_grouped_choices(doc, fragment.node),
        _ => name_positional_choices(doc, fragment.node),
    }

    let nodes = doc.descendants_named(fragment.node, &["choice"]);
    let mut choices = Vec::with_capacity(nodes.len());
    for (index, &node) in nodes.iter().enumerate() {
        let correctness = doc.attr(node, "correct").ok_or_else(|| {
            malformed(kind, fragment, format!("choice {} has no correct attribute", index))
        })?;

        let partial_credit = if correctness.eq_ignore_ascii_case("partial") {
            let weight = doc
                .attr(node, "point_value")
                .and_then(|value| value.trim().parse::<f64>().ok())
                .unwrap_or(DEFAULT_PARTIAL_CREDIT);
            Some(weight)
        } else {
            None
        };

        choices.push(Choice {
            name: doc.attr(node, "name").unwrap_or_default().to_string(),
            id: doc.attr(node, "id").map(str::to_string),
            text: doc.text_without(node, CHOICE_FEEDBACK_TAGS).trim().to_string(),
            correct: correctness.eq_ignore_ascii_case("true"),
            partial_credit,
        });
    }

    let answers = choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| choice.correct)
        .map(|(index, _)| index)
        .collect();
    let options = choices.iter().map(|choice| choice.text.clone()).collect();

    Ok(Extracted {
        options: Some(options),
        choices: Some(choices),
        answers: AnswerSpec::Indices(answers),
        solution: String::new(),
    })
}

/// Mark every `<choicegroup>` as multiple choice and name every choice:
/// `choice_<name>` when named, else `choice_<n>` counting the unnamed ones
fn name_grouped_choices(doc: &mut MarkupDocument, response: NodeId) {
    for group in doc.descendants_named(response, &["choicegroup"]) {
        if doc.attr(group, "type") != Some("MultipleChoice") {
            doc.set_attr(group, "type", "MultipleChoice");
        }
    }

    let mut counter = 0;
    for choice in doc.descendants_named(response, &["choice"]) {
        let name = match doc.attr(choice, "name") {
            Some(name) => format!("choice_{}", name),
            None => {
                let name = format!("choice_{}", counter);
                counter += 1;
                name
            }
        };
        doc.set_attr(choice, "name", name);
    }
}

/// Name every choice `choice_<index>` and give unlabelled ones ids `A`, `B`, ...
fn name_positional_choices(doc: &mut MarkupDocument, response: NodeId) {
    for (index, choice) in doc.descendants_named(response, &["choice"]).into_iter().enumerate() {
        doc.set_attr(choice, "name", format!("choice_{}", index));
        if doc.attr(choice, "id").map_or(true, str::is_empty) {
            doc.set_attr(choice, "id", letter_id(index));
        }
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`
fn letter_id(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// How a string-match fragment compares answers, from its `type` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchMode {
    pub regex: bool,
    pub case_insensitive: bool,
}

impl MatchMode {
    pub fn from_type_attr(value: Option<&str>) -> Self {
        let tokens: Vec<String> = value
            .unwrap_or_default()
            .split(' ')
            .map(str::to_lowercase)
            .collect();
        Self {
            regex: tokens.iter().any(|token| token == "regexp"),
            case_insensitive: tokens.iter().any(|token| token == "ci"),
        }
    }
}

fn extract_string_match(doc: &MarkupDocument, fragment: &Fragment) -> Result<Extracted, FragmentError> {
    let kind = ResponseKind::StringMatch;
    let answer = doc
        .attr(fragment.node, "answer")
        .ok_or_else(|| malformed(kind, fragment, "missing answer attribute"))?;
    let mode = MatchMode::from_type_attr(doc.attr(fragment.node, "type"));

    let candidates: Vec<&str> = if OR_SEPARATOR.is_match(answer) {
        OR_SEPARATOR.split(answer).collect()
    } else {
        let mut candidates = vec![answer];
        for (index, additional) in doc
            .children_named(fragment.node, "additional_answer")
            .into_iter()
            .enumerate()
        {
            let value = doc.attr(additional, "answer").ok_or_else(|| {
                malformed(
                    kind,
                    fragment,
                    format!("additional_answer {} has no answer", index),
                )
            })?;
            candidates.push(value);
        }
        candidates
    };

    let answers = candidates
        .into_iter()
        .map(|candidate| StringAnswer {
            text: candidate.trim().to_string(),
            regex: mode.regex,
            case_insensitive: mode.case_insensitive,
        })
        .collect();

    Ok(Extracted {
        options: None,
        choices: None,
        answers: AnswerSpec::Strings(answers),
        solution: String::new(),
    })
}

/// Flattened text of the fragment's solution, empty when there is none
///
/// A `<solution>` inside the fragment wins over a document-level solution
/// carrying the fragment's id. Solutions nested in other fragments never match.
pub fn solution_text(doc: &MarkupDocument, fragment: &Fragment) -> String {
    let solution = doc
        .descendants_named(fragment.node, &["solution"])
        .into_iter()
        .next()
        .or_else(|| {
            doc.find_all(&["solution"]).into_iter().find(|&node| {
                doc.attr(node, "id") == Some(fragment.id.as_str()) && !inside_response(doc, node)
            })
        });

    match solution {
        Some(node) => doc
            .text_content(node)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
        None => String::new(),
    }
}

fn inside_response(doc: &MarkupDocument, node: NodeId) -> bool {
    let mut current = doc.parent(node);
    while let Some(ancestor) = current {
        if doc.tag(ancestor).is_some_and(|tag| RESPONSE_TAGS.contains(&tag)) {
            return true;
        }
        current = doc.parent(ancestor);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::normalize::normalize;

    fn fragment_of(markup: &str, tag: &str) -> (MarkupDocument, Fragment) {
        let mut doc = MarkupDocument::parse(markup).unwrap();
        normalize(&mut doc);
        let node = doc.find_all(&[tag])[0];
        doc.set_attr(node, "id", "p_1");
        let fragment = Fragment {
            node,
            id: "p_1".to_string(),
            tag: tag.to_string(),
        };
        (doc, fragment)
    }

    #[test]
    fn test_multiple_choice_answers_and_options() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><multiplechoiceresponse><choicegroup type="Other">
                <choice correct="false">Lyon</choice>
                <choice correct="TRUE">Paris <choicehint>Yes</choicehint></choice>
                <choice correct="false" name="nice">Nice</choice>
            </choicegroup></multiplechoiceresponse></problem>"#,
            "multiplechoiceresponse",
        );

        let extracted = extract(ResponseKind::MultipleChoice, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.answers, AnswerSpec::Indices(vec![1]));
        assert_eq!(
            extracted.options,
            Some(vec!["Lyon".to_string(), "Paris".to_string(), "Nice".to_string()])
        );

        let names: Vec<String> = extracted
            .choices
            .unwrap()
            .into_iter()
            .map(|choice| choice.name)
            .collect();
        assert_eq!(names, vec!["choice_0", "choice_1", "choice_nice"]);

        let group = doc.find_all(&["choicegroup"])[0];
        assert_eq!(doc.attr(group, "type"), Some("MultipleChoice"));
    }

    #[test]
    fn test_partial_credit() {
        let (mut doc, fragment) = fragment_of(
            r#"<multiplechoiceresponse><choicegroup>
                <choice correct="partial">Almost</choice>
                <choice correct="partial" point_value="0.25">Barely</choice>
                <choice correct="true">Right</choice>
            </choicegroup></multiplechoiceresponse>"#,
            "multiplechoiceresponse",
        );

        let extracted = extract(ResponseKind::MultipleChoice, &mut doc, &fragment).unwrap();
        let choices = extracted.choices.unwrap();
        assert_eq!(choices[0].partial_credit, Some(DEFAULT_PARTIAL_CREDIT));
        assert_eq!(choices[1].partial_credit, Some(0.25));
        assert_eq!(choices[2].partial_credit, None);
        assert_eq!(extracted.answers, AnswerSpec::Indices(vec![2]));
    }

    #[test]
    fn test_checkbox_multiple_correct_and_ids() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><choiceresponse><checkboxgroup>
                <choice correct="true">2</choice>
                <choice correct="false" id="keep">3</choice>
                <choice correct="True">4</choice>
            </checkboxgroup></choiceresponse></problem>"#,
            "choiceresponse",
        );

        let extracted = extract(ResponseKind::Checkbox, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.answers, AnswerSpec::Indices(vec![0, 2]));
        let ids: Vec<Option<String>> = extracted.choices.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec![Some("A".to_string()), Some("keep".to_string()), Some("C".to_string())]
        );
    }

    #[test]
    fn test_checkbox_missing_correctness_is_malformed() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><choiceresponse><checkboxgroup>
                <choice correct="true">a</choice>
                <choice>b</choice>
            </checkboxgroup></choiceresponse></problem>"#,
            "choiceresponse",
        );

        let err = extract(ResponseKind::Checkbox, &mut doc, &fragment).unwrap_err();
        assert!(matches!(
            &err,
            FragmentError::Malformed { fragment_id, kind: ResponseKind::Checkbox, .. } if fragment_id == "p_1"
        ));
    }

    #[test]
    fn test_string_match_legacy_or_shorthand() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="cat_or_Cat_or_ CAT "/></problem>"#,
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.answers.texts(), vec!["cat", "Cat", "CAT"]);
        assert!(extracted.options.is_none());
        let answers = extracted.answers.strings().unwrap();
        assert!(answers.iter().all(|a| !a.regex && !a.case_insensitive));
    }

    #[test]
    fn test_string_match_or_detected_case_insensitively() {
        let (mut doc, fragment) = fragment_of(
            r#"<stringresponse answer="dog_OR_hound"><additional_answer answer="ignored"/></stringresponse>"#,
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.answers.texts(), vec!["dog", "hound"]);
    }

    #[test]
    fn test_string_match_explicit_form() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="Paris"><additional_answer answer="paris"/></stringresponse></problem>"#,
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.answers.texts(), vec!["Paris", "paris"]);
    }

    #[test]
    fn test_string_match_legacy_additional_answer() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="Paris"><additional_answer> Lutetia </additional_answer></stringresponse></problem>"#,
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.answers.texts(), vec!["Paris", "Lutetia"]);
    }

    #[test]
    fn test_string_match_flags_apply_to_every_answer() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="^a+$" type="regexp ci"><additional_answer answer="b"/></stringresponse></problem>"#,
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        let answers = extracted.answers.strings().unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|a| a.regex && a.case_insensitive));
    }

    #[test]
    fn test_string_match_missing_answer_is_malformed() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><stringresponse type="ci"/></problem>"#,
            "stringresponse",
        );
        let err = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap_err();
        assert_eq!(err.fragment_id(), "p_1");
    }

    #[test]
    fn test_match_mode_tokens() {
        assert_eq!(MatchMode::from_type_attr(None), MatchMode::default());
        let mode = MatchMode::from_type_attr(Some("CI"));
        assert!(mode.case_insensitive && !mode.regex);
        let mode = MatchMode::from_type_attr(Some("regexpci"));
        assert!(!mode.case_insensitive && !mode.regex);
    }

    #[test]
    fn test_solution_flattened() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="4"><solution><div><p>Two plus
                two is four</p></div></solution></stringresponse></problem>"#,
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.solution, "Twoplustwoisfour");
    }

    #[test]
    fn test_solution_by_fragment_id_or_absent() {
        let (doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="4"/><solution id="p_1"><p>Because</p></solution></problem>"#,
            "stringresponse",
        );
        assert_eq!(solution_text(&doc, &fragment), "Because");

        let (doc, fragment) = fragment_of(
            r#"<problem><stringresponse answer="4"/><solution id="p_2">No</solution></problem>"#,
            "stringresponse",
        );
        assert_eq!(solution_text(&doc, &fragment), "");
    }

    #[test]
    fn test_solution_drops_tabs_and_carriage_returns() {
        let (mut doc, fragment) = fragment_of(
            "<problem><stringresponse answer=\"4\"><solution>\r\n\t<p>Two\tplus two</p>\r\n</solution></stringresponse></problem>",
            "stringresponse",
        );
        let extracted = extract(ResponseKind::StringMatch, &mut doc, &fragment).unwrap();
        assert_eq!(extracted.solution, "Twoplustwo");
    }

    #[test]
    fn test_nested_choices_are_named() {
        let (mut doc, fragment) = fragment_of(
            r#"<problem><multiplechoiceresponse><choicegroup><div>
                <choice correct="true">Deep</choice>
            </div><choice correct="false">Shallow</choice></choicegroup></multiplechoiceresponse></problem>"#,
            "multiplechoiceresponse",
        );
        let extracted = extract(ResponseKind::MultipleChoice, &mut doc, &fragment).unwrap();
        let names: Vec<String> = extracted.choices.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["choice_0", "choice_1"]);
    }

    #[test]
    fn test_letter_id() {
        assert_eq!(letter_id(0), "A");
        assert_eq!(letter_id(25), "Z");
        assert_eq!(letter_id(26), "AA");
        assert_eq!(letter_id(27), "AB");
    }
}
