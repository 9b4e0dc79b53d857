//! Serve command: load the course store and run the HTTP API

use crate::api;
use crate::models::ProblemDataConfig;
use crate::store::ContentResolver;
use crate::Result;
use colored::Colorize;
use std::sync::Arc;

pub async fn run(config: &ProblemDataConfig) -> Result<()> {
    let store = super::load_store(config)?;
    println!(
        "{}",
        format!(
            "Loaded {} course(s), {} block(s) from {}",
            store.courses().len(),
            store.block_count(),
            config.store.course_dir.display()
        )
        .cyan()
    );

    let resolver: Arc<dyn ContentResolver> = Arc::new(store);
    api::start_server(config, resolver).await
}
