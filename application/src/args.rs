//! [`Args`] definitions.

use clap::{Parser, Subcommand};

/// Operator tool of the business marketplace.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// [`Command`] to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Operation to run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Subcommand)]
pub enum Command {
    /// Applies pending database migrations.
    Migrate,

    /// Marks as sold the listings whose transactions are completed.
    Reconcile {
        /// Only reports the stranded listings, without changing them.
        #[arg(long)]
        dry_run: bool,
    },
}
