use super::problem::DeclaredKinds;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Course files (YAML on disk)
// =============================================================================

/// One course as authored in a `*.yaml` course file
#[derive(Debug, Clone, Deserialize)]
pub struct CourseFile {
    /// Course key, e.g. `course-v1:Org+CS101+2024`
    pub course: String,
    pub display_name: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub children: Vec<BlockSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockSpec {
    /// Block id, unique within the course
    pub id: String,
    pub category: BlockCategory,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub children: Vec<BlockSpec>,

    /// Inline problem markup
    #[serde(default)]
    pub data: Option<String>,
    /// Problem markup file, relative to the course file
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    /// Explicit version token; defaults to a checksum of the markup
    #[serde(default)]
    pub version: Option<String>,
    /// Classified response kinds; computed from the markup when absent
    #[serde(default)]
    pub problem_types: Option<Vec<String>>,
    /// Earlier revisions of the markup
    #[serde(default)]
    pub revisions: Vec<RevisionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevisionSpec {
    pub version: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Course,
    Chapter,
    Sequential,
    Vertical,
    Problem,
    Html,
    Video,
}

impl BlockCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockCategory::Course => "course",
            BlockCategory::Chapter => "chapter",
            BlockCategory::Sequential => "sequential",
            BlockCategory::Vertical => "vertical",
            BlockCategory::Problem => "problem",
            BlockCategory::Html => "html",
            BlockCategory::Video => "video",
        }
    }
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Loaded content
// =============================================================================

/// A course run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub key: String,
    /// Usage id of the course root block
    pub root: String,
    pub display_name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Course {
    /// True when the course has started and not yet ended on `today`
    pub fn is_running(&self, today: NaiveDate) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start <= today && today <= end)
    }
}

/// One block of a course tree, addressed by its usage id
#[derive(Debug, Clone)]
pub struct Block {
    pub usage_id: String,
    pub category: BlockCategory,
    pub display_name: String,
    /// Usage ids of the children, in course order
    pub children: Vec<String>,
    pub problem: Option<ProblemData>,
}

impl Block {
    pub fn is_problem(&self) -> bool {
        self.category == BlockCategory::Problem
    }

    /// Declared kinds of a problem block, `None` for other blocks
    pub fn kinds(&self) -> Option<&DeclaredKinds> {
        self.problem.as_ref().map(|problem| &problem.kinds)
    }
}

/// Markup of a problem block, current and earlier
#[derive(Debug, Clone)]
pub struct ProblemData {
    pub markup: String,
    pub version: String,
    pub kinds: DeclaredKinds,
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub version: String,
    pub markup: String,
    pub kinds: DeclaredKinds,
}
