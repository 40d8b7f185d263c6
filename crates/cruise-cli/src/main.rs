//! cruise CLI
//!
//! Validates, upgrades, formats and inspects cruise configuration files.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::CliContext;
use error::Result;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` overrides the `info` default; `--verbose` forces `debug`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run(cli: Cli) -> Result<()> {
    let ctx = CliContext::discover(cli.settings.as_deref())?;
    match cli.command {
        Commands::Validate { file } => commands::run_validate(&ctx, &file),
        Commands::Upgrade { file, diff, dry_run } => commands::run_upgrade(&ctx, &file, diff, dry_run),
        Commands::Format { file, check } => commands::run_format(&ctx, &file, check),
        Commands::Encrypt { plaintext } => commands::run_encrypt(&ctx, &plaintext),
        Commands::Decrypt { token } => commands::run_decrypt(&ctx, &token),
        Commands::Show { file, pipeline, json } => commands::run_show(&ctx, &file, pipeline.as_deref(), json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let error: error::CliError = cruise_core::Error::Merge {
            kind: "Pipeline".into(),
            name: "test".into(),
            first: "repo-a".into(),
            second: "repo-b".into(),
        }
        .into();
        assert_eq!(error.to_string(), "Pipeline 'test' is defined in both repo-a and repo-b");
    }
}
