//! Command implementations for cruise-cli

pub mod format;
pub mod secret;
pub mod show;
pub mod upgrade;
pub mod validate;

pub use format::run_format;
pub use secret::{run_decrypt, run_encrypt};
pub use show::run_show;
pub use upgrade::run_upgrade;
pub use validate::run_validate;

use crate::context::CliContext;
use crate::error::{CliError, Result};
use colored::Colorize;
use cruise_validate::ValidationError;
use std::fs;
use std::path::Path;

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CliError::user(format!("Cannot read {}: {}", path.display(), e)))
}

fn print_validation_errors(errors: &[ValidationError]) {
    for error in errors {
        eprintln!("  {} {}", error.path.yellow(), error.message);
    }
}

/// Back up `path` when backups are enabled, then replace its content.
fn write_with_backup(ctx: &CliContext, path: &Path, content: &str) -> Result<()> {
    if let Some(backups) = ctx.backups(path) {
        let backup = backups.create_backup(path)?;
        println!("{} {}", "Backup".blue().bold(), backup.path.display());
    }
    fs::write(path, content)?;
    Ok(())
}
