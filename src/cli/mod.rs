//! [Command-line interface](Cli) (CLI) of the main binary.

#[cfg(test)]
mod tests;

pub mod nextread;
pub mod profile;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function.
/// ```no_run
/// use clap::Parser;
/// let args = vargram::Cli::parse();
/// ```
/// The command-line arguments can also be given manually:
/// ```rust
/// use clap::Parser;
/// use vargram::cli::{Cli, Command};
///
/// let input = ["vargram", "profile", "--data", "nextclade.tsv", "--key", "BA.2.tsv:BA.2", "-o", "profile.csv"];
/// let args = Cli::parse_from(input);
/// let Command::Profile(args) = args.command else { panic!("profile command") };
/// assert_eq!(args.keys[0].label.as_deref(), Some("BA.2"));
/// assert_eq!(args.output[0].to_str(), Some("profile.csv"));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "vargram", author, version)]
#[clap(about = "vargram plots mutation profiles of batches of sequences against key lineages.")]
pub struct Cli {
    #[clap(subcommand)]
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants).
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    #[clap(about = "Plot a mutation profile, or save its table.")]
    Profile(profile::ProfileArgs),
    #[clap(about = "Run Nextclade on sequences and save its output table.")]
    Nextread(nextread::NextreadArgs),
}

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// The output verbosity level.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ValueEnum)]
pub enum Verbosity {
    #[default]
    Info,
    Warn,
    Debug,
    Error,
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // lowercase for RUST_LOG
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}
