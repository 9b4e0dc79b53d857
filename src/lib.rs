// problemdata - quiz problem extraction from course problem markup
// Parses problem documents into structured question records and serves them over HTTP

pub mod api;
pub mod cli;
pub mod models;
pub mod parser;
pub mod services;
pub mod store;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use models::{DeclaredKinds, ProblemContent, ProblemDataConfig, ProblemRecord, ResponseKind};
pub use parser::{parse, FragmentPolicy};
pub use store::{ContentResolver, CourseStore};
