//! Service layer for problemdata
//!
//! Business logic shared by the HTTP API and the CLI. Services take a
//! [`ContentResolver`](crate::store::ContentResolver) and return typed
//! results; the callers decide how to present them.

pub mod course_service;
pub mod problem_service;

pub use course_service::{
    kind_counts, list_courses, list_sections, problem_types, section_counts, CourseSummary,
    SectionSummary,
};
pub use problem_service::{
    list_problems, problem_details, section_problems, Page, ProblemQuery, ProblemRef,
    SectionProblems,
};

use crate::models::{ProblemError, ResolveError};

/// Errors surfaced by the service layer
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Problem(#[from] ProblemError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid search pattern: {0}")]
    Search(#[from] regex::Error),

    #[error("Invalid page: {0}")]
    InvalidPage(usize),
}

impl ServiceError {
    /// True when the caller sent something unusable, as opposed to a server-side failure
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::Resolve(e) => e.is_invalid_id(),
            ServiceError::Problem(e) => e.is_unsupported(),
            ServiceError::InvalidArgument(_)
            | ServiceError::Search(_)
            | ServiceError::InvalidPage(_) => true,
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
