//! CLI argument parsing for labeltool

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::session::Decision;

#[derive(Parser, Debug)]
#[command(name = "lt")]
#[command(author, version, about = "Judge report relevance for each user, one pair at a time", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision the cursor and annotation rows
    Init {
        /// Overwrite existing rows with the initial state
        #[arg(long)]
        reset: bool,
    },

    /// Replace the catalog with reports and users from JSON/YAML files
    Import {
        /// Reports file (JSON array or YAML list)
        #[arg(short, long, required = true)]
        reports: PathBuf,

        /// Users file (JSON array or YAML list)
        #[arg(short, long, required = true)]
        users: PathBuf,
    },

    /// Show phase and progress
    Status,

    /// Render the current screen
    Show,

    /// Dismiss the tutorial and begin annotating
    Start,

    /// Judge the current pair and advance
    Mark {
        /// relevant (r) or not-relevant (n)
        #[arg(value_enum)]
        decision: DecisionArg,
    },

    /// Annotate interactively
    Run,

    /// Write the annotation map as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionArg {
    #[value(alias = "r")]
    Relevant,
    #[value(alias = "n")]
    NotRelevant,
}

impl From<DecisionArg> for Decision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Relevant => Decision::Relevant,
            DecisionArg::NotRelevant => Decision::NotRelevant,
        }
    }
}
