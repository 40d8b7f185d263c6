//! Format command implementation

use std::path::Path;

use colored::Colorize;

use super::{read_file, write_with_backup};
use crate::context::CliContext;
use crate::error::{CliError, Result};

/// Re-serialize `file` in canonical form.
///
/// Older documents are migrated first, so formatting also upgrades them.
pub fn run_format(ctx: &CliContext, file: &Path, check: bool) -> Result<()> {
    let bytes = read_file(file)?;
    let cipher = ctx.cipher(Some(file))?;
    let editable = ctx.loader(&cipher).load_for_edit(&bytes)?;

    let canonical = cruise_codec::serialize(&editable.config_for_edit);
    if canonical == String::from_utf8_lossy(&bytes) {
        println!("{} {} is already formatted", "OK".green().bold(), file.display());
        return Ok(());
    }
    if check {
        return Err(CliError::user(format!("{} is not formatted", file.display())));
    }

    write_with_backup(ctx, file, &canonical)?;
    println!("{} {}", "Formatted".green().bold(), file.display());
    Ok(())
}
