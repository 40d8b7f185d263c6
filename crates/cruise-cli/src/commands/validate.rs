//! Validate command implementation

use std::path::Path;

use colored::Colorize;
use cruise_core::Error;

use super::{print_validation_errors, read_file};
use crate::context::CliContext;
use crate::error::{CliError, Result};

/// Upgrade in memory, parse, preprocess and validate `file`.
///
/// Every validation error is printed before the command fails.
pub fn run_validate(ctx: &CliContext, file: &Path) -> Result<()> {
    let bytes = read_file(file)?;
    let cipher = ctx.cipher(Some(file))?;

    match ctx.loader(&cipher).load(&bytes, Vec::new()) {
        Ok(loaded) => {
            let config = &loaded.holder.config;
            println!(
                "{} {} is valid ({} pipelines, {} templates, {} environments)",
                "OK".green().bold(),
                file.display(),
                config.all_pipelines().count(),
                config.templates.len(),
                config.environments.len(),
            );
            if !loaded.migration.is_noop() {
                println!(
                    "   Document is at schema version {}; run {} to migrate it to {}.",
                    loaded.migration.from,
                    "cruise upgrade".cyan(),
                    loaded.migration.to
                );
            }
            Ok(())
        }
        Err(Error::Validation(errors)) => {
            eprintln!("{} {}", "Invalid".red().bold(), file.display());
            print_validation_errors(&errors);
            Err(CliError::user(format!("{} validation error(s) found", errors.len())))
        }
        Err(e) => Err(e.into()),
    }
}
