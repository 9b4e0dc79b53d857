//! Markup CLI commands: parse, multiple, classify
//!
//! These work on a single markup file and never touch the course store.

use crate::models::{AnswerSpec, DeclaredKinds, ProblemContent, ProblemRecord};
use crate::parser::{self, FragmentPolicy};
use crate::store::markup_version;
use crate::{Context, Result};
use colored::Colorize;
use std::path::Path;

fn read_markup(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Content id of a file: its stem
fn file_id(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "problem".to_string())
}

/// Extract the problem records of a markup file
pub fn run_parse(
    file: &Path,
    kinds: &[String],
    id: Option<&str>,
    version: Option<&str>,
    policy: FragmentPolicy,
    json: bool,
) -> Result<()> {
    let markup = read_markup(file)?;
    let declared = DeclaredKinds::from_tags(kinds.iter().cloned());
    let id = id.map(str::to_string).unwrap_or_else(|| file_id(file));
    let version = version
        .map(str::to_string)
        .unwrap_or_else(|| markup_version(&markup));

    let content = parser::parse(&markup, &declared, &version, &id, policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
        return Ok(());
    }

    match content {
        None => println!("{}", format!("No problems found in {}", file.display()).yellow()),
        Some(content) => print_content(&content),
    }
    Ok(())
}

/// Report whether a markup file holds more than one problem
pub fn run_multiple(file: &Path, kinds: &[String]) -> Result<()> {
    let markup = read_markup(file)?;
    let declared = DeclaredKinds::from_tags(kinds.iter().cloned());
    if parser::has_multiple_markup(&markup, &declared)? {
        println!("{}", "multiple".yellow());
    } else {
        println!("{}", "single".green());
    }
    Ok(())
}

/// Print the response kinds found in a markup file
pub fn run_classify(file: &Path) -> Result<()> {
    let markup = read_markup(file)?;
    let (doc, report) = parser::load(&markup)?;
    let kinds = parser::classify(&doc);

    println!("{}", format!("Kinds: {}", kinds).cyan().bold());
    println!("   Markup:   {:?}", report.generation());
    if report.rewrites() > 0 {
        println!("   Rewrites: {}", report.rewrites());
    }
    if parser::has_multiple(&doc, &kinds) {
        println!("   {}", "Holds more than one problem".yellow());
    }
    Ok(())
}

/// Human-readable listing of parsed content
pub fn print_content(content: &ProblemContent) {
    let records = content.records();
    println!(
        "{}",
        format!("✓ {} problem(s)", records.len()).green().bold()
    );
    for record in records {
        print_record(record);
    }
}

fn print_record(record: &ProblemRecord) {
    println!();
    println!("{} {}", format!("[{}]", record.id).cyan(), record.kind.to_string().bold());
    if !record.title.is_empty() {
        println!("   Title:    {}", record.title);
    }

    if let Some(options) = &record.options {
        for (index, option) in options.iter().enumerate() {
            let correct = record
                .answers
                .indices()
                .is_some_and(|indices| indices.contains(&index));
            if correct {
                println!("   {} {}", "✓".green(), option);
            } else {
                println!("   {} {}", "·".bright_black(), option);
            }
        }
    }

    if let AnswerSpec::Strings(answers) = &record.answers {
        for answer in answers {
            let mut flags = Vec::new();
            if answer.regex {
                flags.push("regexp");
            }
            if answer.case_insensitive {
                flags.push("ci");
            }
            if flags.is_empty() {
                println!("   Answer:   {}", answer.text);
            } else {
                println!("   Answer:   {} ({})", answer.text, flags.join(", "));
            }
        }
    }

    if !record.solution.is_empty() {
        println!("   Solution: {}", record.solution);
    }
    println!("   Version:  {}", record.version.bright_black());
}
