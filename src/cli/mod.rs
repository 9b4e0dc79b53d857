//! CLI commands

pub mod markup;
pub mod problems;
pub mod server;

use crate::models::ProblemDataConfig;
use crate::store::CourseStore;
use crate::{Context, Result};

/// Load the course store named by the config
pub fn load_store(config: &ProblemDataConfig) -> Result<CourseStore> {
    let dir = &config.store.course_dir;
    if !dir.is_dir() {
        anyhow::bail!("Course directory not found: {}", dir.display());
    }
    CourseStore::load(dir)
        .with_context(|| format!("Failed to load courses from {}", dir.display()))
}
