//! Upgrade command implementation
//!
//! Migrates a document to the current schema version and writes it back.

use std::path::Path;

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use super::{print_validation_errors, read_file, write_with_backup};
use crate::context::CliContext;
use crate::error::Result;

pub fn run_upgrade(ctx: &CliContext, file: &Path, diff: bool, dry_run: bool) -> Result<()> {
    let bytes = read_file(file)?;
    let cipher = ctx.cipher(Some(file))?;
    // Parsing the result guarantees a broken migration is never written.
    let editable = ctx.loader(&cipher).load_for_edit(&bytes)?;
    let report = &editable.migration;

    if report.is_noop() {
        println!(
            "{} {} is already at schema version {}",
            "OK".green().bold(),
            file.display(),
            report.to
        );
        return Ok(());
    }

    if diff {
        print_diff(file, &String::from_utf8_lossy(&bytes), &editable.xml);
    }

    if !editable.errors.is_empty() {
        eprintln!(
            "{} the upgraded document has {} validation error(s)",
            "Warning:".yellow().bold(),
            editable.errors.len()
        );
        print_validation_errors(&editable.errors);
    }

    let steps = report
        .applied
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if dry_run {
        println!(
            "{} Would upgrade {} from version {} to {} (steps: {})",
            "[dry-run]".yellow(),
            file.display(),
            report.from,
            report.to,
            if steps.is_empty() { "none" } else { steps.as_str() }
        );
        return Ok(());
    }

    write_with_backup(ctx, file, &editable.xml)?;
    println!(
        "{} {} from version {} to {}",
        "Upgraded".green().bold(),
        file.display(),
        report.from,
        report.to
    );
    Ok(())
}

/// Print a colored unified diff between the original and upgraded text
fn print_diff(file: &Path, before: &str, after: &str) {
    let name = file.display().to_string();
    let diff = TextDiff::from_lines(before, after);
    println!("{}", format!("--- {name} (original)").red());
    println!("{}", format!("+++ {name} (upgraded)").green());
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = change.to_string_lossy();
            let line = line.trim_end_matches('\n');
            match change.tag() {
                ChangeTag::Delete => println!("{}", format!("-{line}").red()),
                ChangeTag::Insert => println!("{}", format!("+{line}").green()),
                ChangeTag::Equal => println!(" {line}"),
            }
        }
    }
}
