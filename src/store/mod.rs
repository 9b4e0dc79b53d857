//! Content resolution: opaque content ids to problem markup
//!
//! The parser never reads content itself; callers resolve an id through a
//! [`ContentResolver`] and hand the markup, declared kinds and version over.

mod course_store;

pub use course_store::{markup_version, CourseStore};

use crate::models::{Block, Course, DeclaredKinds, ResolveError};
use std::collections::VecDeque;

const COURSE_KEY_PREFIX: &str = "course-v1:";
const BLOCK_KEY_PREFIX: &str = "block-v1:";

/// Markup of one problem at one revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub id: String,
    pub markup: String,
    pub kinds: DeclaredKinds,
    pub version: String,
}

/// Source of course blocks and problem markup
pub trait ContentResolver: Send + Sync {
    /// Look up a block by content id
    fn block(&self, id: &str) -> Result<&Block, ResolveError>;

    /// Every known course
    fn courses(&self) -> Vec<&Course>;

    /// Markup of a problem, optionally at a specific version
    fn resolve(&self, id: &str, version: Option<&str>) -> Result<ResolvedContent, ResolveError> {
        let block = self.block(id)?;
        let problem = block
            .problem
            .as_ref()
            .ok_or_else(|| ResolveError::NotAProblem(block.usage_id.clone()))?;

        let (markup, kinds) = match version {
            None => (&problem.markup, &problem.kinds),
            Some(version) if version == problem.version => (&problem.markup, &problem.kinds),
            Some(version) => problem
                .revisions
                .iter()
                .find(|revision| revision.version == version)
                .map(|revision| (&revision.markup, &revision.kinds))
                .ok_or_else(|| ResolveError::UnknownVersion {
                    id: block.usage_id.clone(),
                    version: version.to_string(),
                })?,
        };

        Ok(ResolvedContent {
            id: block.usage_id.clone(),
            markup: markup.clone(),
            kinds: kinds.clone(),
            version: version.unwrap_or(&problem.version).to_string(),
        })
    }

    /// Usage ids of the children of a block
    fn children(&self, id: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.block(id)?.children.clone())
    }
}

/// A block and everything below it, breadth first, the block itself first
pub fn descendants<'a, R>(resolver: &'a R, id: &str) -> Result<Vec<&'a Block>, ResolveError>
where
    R: ContentResolver + ?Sized,
{
    let mut blocks = Vec::new();
    let mut pending = VecDeque::from([resolver.block(id)?]);
    while let Some(block) = pending.pop_front() {
        for child in &block.children {
            pending.push_back(resolver.block(child)?);
        }
        blocks.push(block);
    }
    Ok(blocks)
}

/// Canonical usage id of a content id
///
/// A course key (`course-v1:ORG+NUM+RUN`) names its root block.
pub fn usage_id(id: &str) -> Result<String, ResolveError> {
    let id = id.trim();
    if let Some(run) = id.strip_prefix(COURSE_KEY_PREFIX) {
        if run.is_empty() {
            return Err(ResolveError::InvalidId(id.to_string()));
        }
        return Ok(format!("{}{}+type@course+block@course", BLOCK_KEY_PREFIX, run));
    }

    let is_usage_id = id
        .strip_prefix(BLOCK_KEY_PREFIX)
        .is_some_and(|rest| rest.contains("+type@") && rest.contains("+block@"));
    if is_usage_id {
        Ok(id.to_string())
    } else {
        Err(ResolveError::InvalidId(id.to_string()))
    }
}

/// Usage id of a block inside a course
pub fn block_usage_id(course_key: &str, category: &str, block_id: &str) -> Result<String, ResolveError> {
    let run = course_key
        .strip_prefix(COURSE_KEY_PREFIX)
        .filter(|run| !run.is_empty())
        .ok_or_else(|| ResolveError::InvalidId(course_key.to_string()))?;
    Ok(format!("{}{}+type@{}+block@{}", BLOCK_KEY_PREFIX, run, category, block_id))
}
