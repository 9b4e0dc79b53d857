//! Course store CLI commands: problems, detail

use super::markup::print_content;
use crate::models::ProblemDataConfig;
use crate::services::{self, ProblemQuery, ProblemRef};
use crate::Result;
use colored::Colorize;

/// List the problems under a block, one page at a time
pub fn run_list(config: &ProblemDataConfig, query: &ProblemQuery, json: bool) -> Result<()> {
    let store = super::load_store(config)?;
    let page = services::list_problems(
        &store,
        query,
        &config.pagination,
        config.parser.fragment_policy,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Problems under {}: {}", query.block_id, page.count)
            .cyan()
            .bold()
    );
    for content in page.results.iter().flatten() {
        print_content(content);
    }

    let mut nav = Vec::new();
    if let Some(previous) = page.previous {
        nav.push(format!("previous: --page {}", previous));
    }
    if let Some(next) = page.next {
        nav.push(format!("next: --page {}", next));
    }
    if !nav.is_empty() {
        println!();
        println!("{}", nav.join("  ").bright_black());
    }
    Ok(())
}

/// Parse and print the given problems
pub fn run_detail(config: &ProblemDataConfig, ids: &[String], json: bool) -> Result<()> {
    let store = super::load_store(config)?;
    let refs: Vec<ProblemRef> = ids.iter().map(|id| ProblemRef::from(id.as_str())).collect();
    let details = services::problem_details(&store, &refs, config.parser.fragment_policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    for (id, content) in ids.iter().zip(&details) {
        match content {
            Some(content) => print_content(content),
            None => println!("{}", format!("No problems found in {}", id).yellow()),
        }
    }
    Ok(())
}
