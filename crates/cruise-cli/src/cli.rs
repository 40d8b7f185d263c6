//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cruise - validate, upgrade and inspect pipeline configuration
#[derive(Parser, Debug)]
#[command(name = "cruise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine settings file (defaults to cruise.toml in the working directory)
    #[arg(long, global = true, env = "CRUISE_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Upgrade, parse and validate a configuration file
    Validate {
        file: PathBuf,
    },

    /// Migrate a configuration file to the current schema version
    ///
    /// The file is backed up before it is overwritten.
    Upgrade {
        file: PathBuf,

        /// Print a unified diff of the migration
        #[arg(long)]
        diff: bool,

        /// Do not write the upgraded document
        #[arg(long)]
        dry_run: bool,
    },

    /// Rewrite a configuration file in canonical form
    Format {
        file: PathBuf,

        /// Exit with an error instead of writing when the file is not formatted
        #[arg(long)]
        check: bool,
    },

    /// Encrypt a value with the configured AES key
    Encrypt {
        plaintext: String,
    },

    /// Decrypt a secure value token
    Decrypt {
        token: String,
    },

    /// Print the processed configuration
    Show {
        file: PathBuf,

        /// Only show this pipeline
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
