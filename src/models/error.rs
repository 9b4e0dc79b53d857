use super::problem::ResponseKind;

/// Markup that is not well-formed XML. Parsing never yields a partial document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("Malformed markup at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("Markup has no root element")]
    Empty,

    #[error("Unclosed element <{0}>")]
    Unclosed(String),

    #[error("Unexpected content outside the root element")]
    OutsideRoot,
}

/// Failure of a single response fragment; other fragments of the document are unaffected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("Malformed {kind} fragment {fragment_id}: {reason}")]
    Malformed {
        fragment_id: String,
        kind: ResponseKind,
        reason: String,
    },

    #[error("Fragment {fragment_id}: response type <{tag}> is not supported")]
    Unsupported { fragment_id: String, tag: String },
}

impl FragmentError {
    pub fn fragment_id(&self) -> &str {
        match self {
            FragmentError::Malformed { fragment_id, .. } => fragment_id,
            FragmentError::Unsupported { fragment_id, .. } => fragment_id,
        }
    }
}

/// Errors from parsing one problem document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProblemError {
    #[error("Problem {id}: {source}")]
    Markup {
        id: String,
        #[source]
        source: MarkupError,
    },

    #[error("Problem {id}: declared type {kinds} is not supported")]
    UnsupportedKind { id: String, kinds: String },

    #[error("Problem {id}: {source}")]
    Fragment {
        id: String,
        #[source]
        source: FragmentError,
    },
}

impl ProblemError {
    /// True for failures the API reports as "problem type not supported"
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            ProblemError::UnsupportedKind { .. }
                | ProblemError::Fragment {
                    source: FragmentError::Unsupported { .. },
                    ..
                }
        )
    }

    pub fn problem_id(&self) -> &str {
        match self {
            ProblemError::Markup { id, .. }
            | ProblemError::UnsupportedKind { id, .. }
            | ProblemError::Fragment { id, .. } => id,
        }
    }
}

/// Errors from the content store behind a content identifier
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid content id: {0}")]
    InvalidId(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Unknown version '{version}' of {id}")]
    UnknownVersion { id: String, version: String },

    #[error("Not a problem: {0}")]
    NotAProblem(String),

    #[error("Failed to read course data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse course file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Duplicate block id: {0}")]
    DuplicateId(String),
}

impl ResolveError {
    /// True when the identifier itself could not be resolved
    pub fn is_invalid_id(&self) -> bool {
        matches!(
            self,
            ResolveError::InvalidId(_)
                | ResolveError::NotFound(_)
                | ResolveError::UnknownVersion { .. }
                | ResolveError::NotAProblem(_)
        )
    }
}
