pub mod config;
pub mod course;
pub mod error;
pub mod problem;

pub use config::{PaginationConfig, ParserConfig, ProblemDataConfig, ServerConfig, StoreConfig};
pub use course::{Block, BlockCategory, BlockSpec, Course, CourseFile, ProblemData, Revision, RevisionSpec};
pub use error::{FragmentError, MarkupError, ProblemError, ResolveError};
pub use problem::{
    Accessibility, AnswerSpec, Choice, DeclaredKinds, FragmentKind, InputMeta, ProblemContent,
    ProblemRecord, ResponseKind, StringAnswer,
};
