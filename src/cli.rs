//! Command-line interface of the `survey-traits` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "survey-traits",
    about = "Fit survey-weighted trait models and project them onto the population cell backbone",
    version,
    args_conflicts_with_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run configuration; shorthand for `run <CONFIG>`
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Model every configured trait, write artifacts and the manifest
    Run {
        /// Run configuration (JSON)
        config: PathBuf,
    },

    /// Re-check existing artifacts and rewrite the manifest
    Validate {
        /// Run configuration (JSON)
        config: PathBuf,
    },
}

impl Cli {
    /// The requested command, with a bare config path meaning `run`
    #[must_use]
    pub fn into_command(self) -> Option<Command> {
        self.command
            .or_else(|| self.config.map(|config| Command::Run { config }))
    }
}
