use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Response kinds this crate can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Single correct choice (`<multiplechoiceresponse>`)
    #[serde(rename = "multiplechoiceresponse")]
    MultipleChoice,
    /// Multi-select checkboxes (`<choiceresponse>`)
    #[serde(rename = "choiceresponse")]
    Checkbox,
    /// Free-text string match (`<stringresponse>`)
    #[serde(rename = "stringresponse")]
    StringMatch,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 3] = [
        ResponseKind::MultipleChoice,
        ResponseKind::Checkbox,
        ResponseKind::StringMatch,
    ];

    /// Markup tag name of this kind
    pub fn tag(&self) -> &'static str {
        match self {
            ResponseKind::MultipleChoice => "multiplechoiceresponse",
            ResponseKind::Checkbox => "choiceresponse",
            ResponseKind::StringMatch => "stringresponse",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Choice-based kinds answer with indices into `options`
    pub fn is_choice_based(&self) -> bool {
        matches!(self, ResponseKind::MultipleChoice | ResponseKind::Checkbox)
    }
}

impl std::fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Kind of a response fragment as found in markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    Supported(ResponseKind),
    Unsupported(String),
}

impl FragmentKind {
    pub fn from_tag(tag: &str) -> Self {
        match ResponseKind::from_tag(tag) {
            Some(kind) => FragmentKind::Supported(kind),
            None => FragmentKind::Unsupported(tag.to_string()),
        }
    }
}

/// Response kinds a content store has classified for one document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeclaredKinds {
    /// Nothing declared; the document is classified from its own markup
    #[default]
    None,
    Single(String),
    /// More than one kind: a composite document
    Mixed(BTreeSet<String>),
}

impl DeclaredKinds {
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        match set.len() {
            0 => DeclaredKinds::None,
            1 => DeclaredKinds::Single(set.pop_first().unwrap_or_default()),
            _ => DeclaredKinds::Mixed(set),
        }
    }

    pub fn single(&self) -> Option<&str> {
        match self {
            DeclaredKinds::Single(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, DeclaredKinds::Mixed(_))
    }

    pub fn tags(&self) -> Vec<&str> {
        match self {
            DeclaredKinds::None => Vec::new(),
            DeclaredKinds::Single(tag) => vec![tag.as_str()],
            DeclaredKinds::Mixed(set) => set.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    /// True when exactly `{tag}` was declared
    pub fn is_exactly(&self, tag: &str) -> bool {
        self.single() == Some(tag)
    }

    /// True when at least one declared kind is supported
    pub fn any_supported(&self) -> bool {
        self.tags().iter().any(|tag| ResponseKind::from_tag(tag).is_some())
    }
}

impl std::fmt::Display for DeclaredKinds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclaredKinds::None => write!(f, "(none)"),
            DeclaredKinds::Single(tag) => write!(f, "{}", tag),
            DeclaredKinds::Mixed(set) => {
                let tags: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", tags.join(", "))
            }
        }
    }
}

/// One choice of a multiple-choice or checkbox fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Fragment-scoped name (`choice_0`, `choice_<name>`)
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    pub correct: bool,
    /// Weight of a partially correct choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_credit: Option<f64>,
}

/// One acceptable answer of a string-match fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringAnswer {
    pub text: String,
    pub regex: bool,
    pub case_insensitive: bool,
}

/// Normalized answer of a fragment; the variant follows the response kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerSpec {
    /// 0-based positions of the correct choices in source order
    Indices(Vec<usize>),
    Strings(Vec<StringAnswer>),
}

impl AnswerSpec {
    pub fn indices(&self) -> Option<&[usize]> {
        match self {
            AnswerSpec::Indices(indices) => Some(indices),
            AnswerSpec::Strings(_) => None,
        }
    }

    pub fn strings(&self) -> Option<&[StringAnswer]> {
        match self {
            AnswerSpec::Indices(_) => None,
            AnswerSpec::Strings(answers) => Some(answers),
        }
    }

    /// Answer texts of a string-match fragment, empty for choice kinds
    pub fn texts(&self) -> Vec<&str> {
        self.strings()
            .map(|answers| answers.iter().map(|a| a.text.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Accessibility metadata of one input element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMeta {
    pub id: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessibility {
    /// Shared label of a multi-input fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    pub descriptions: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputMeta>,
}

/// One extracted question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    pub answers: AnswerSpec,
    pub solution: String,
    pub version: String,
    #[serde(flatten)]
    pub accessibility: Accessibility,
}

/// Result of assembling one document: a single question or several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProblemContent {
    Single(ProblemRecord),
    Many(Vec<ProblemRecord>),
}

impl ProblemContent {
    pub fn records(&self) -> Vec<&ProblemRecord> {
        match self {
            ProblemContent::Single(record) => vec![record],
            ProblemContent::Many(records) => records.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ProblemContent::Single(_) => 1,
            ProblemContent::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_kind_tags() {
        for kind in ResponseKind::ALL {
            assert_eq!(ResponseKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ResponseKind::from_tag("numericalresponse"), None);
        assert!(ResponseKind::Checkbox.is_choice_based());
        assert!(!ResponseKind::StringMatch.is_choice_based());
    }

    #[test]
    fn test_declared_kinds_from_tags() {
        assert_eq!(DeclaredKinds::from_tags(Vec::<String>::new()), DeclaredKinds::None);
        assert_eq!(
            DeclaredKinds::from_tags(["stringresponse"]),
            DeclaredKinds::Single("stringresponse".to_string())
        );
        let mixed = DeclaredKinds::from_tags(["stringresponse", "choiceresponse"]);
        assert!(mixed.is_mixed());
        assert!(mixed.contains("choiceresponse"));
        assert!(!mixed.is_exactly("choiceresponse"));
    }

    #[test]
    fn test_declared_kinds_duplicates_collapse() {
        let kinds = DeclaredKinds::from_tags(["choiceresponse", "choiceresponse"]);
        assert!(kinds.is_exactly("choiceresponse"));
    }

    #[test]
    fn test_fragment_kind() {
        assert_eq!(
            FragmentKind::from_tag("choiceresponse"),
            FragmentKind::Supported(ResponseKind::Checkbox)
        );
        assert_eq!(
            FragmentKind::from_tag("customresponse"),
            FragmentKind::Unsupported("customresponse".to_string())
        );
    }

    #[test]
    fn test_record_serializes_type_and_flattened_a11y() {
        let record = ProblemRecord {
            id: "p1".to_string(),
            kind: ResponseKind::StringMatch,
            title: "Capital?".to_string(),
            options: None,
            choices: None,
            answers: AnswerSpec::Strings(vec![StringAnswer {
                text: "Paris".to_string(),
                regex: false,
                case_insensitive: true,
            }]),
            solution: String::new(),
            version: "v1".to_string(),
            accessibility: Accessibility::default(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "stringresponse");
        assert_eq!(json["answers"][0]["text"], "Paris");
        assert!(json.get("options").is_none());
        assert!(json["descriptions"].as_object().unwrap().is_empty());
    }
}
