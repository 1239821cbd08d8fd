use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bootstrap-dispatch - stage files, then run one module
#[derive(Parser)]
#[command(name = "bootstrap-dispatch")]
#[command(about = "Partition module arguments into file deliveries and a passthrough module")]
#[command(version)]
pub struct Cli {
    /// Dispatcher settings file (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the deliveries and passthrough module without running anything
    Plan {
        /// Flat key=value argument string
        #[arg(short, long, default_value = "")]
        args: String,

        /// Structured arguments (JSON object file)
        #[arg(short, long)]
        complex: Option<PathBuf>,

        /// Shared remote temp dir; a placeholder is used when omitted
        #[arg(short, long)]
        tmp: Option<String>,
    },
    /// Apply observer cleanup to a result record (JSON)
    Clean {
        /// Result file; reads stdin when omitted
        input: Option<PathBuf>,
    },
    /// Validate a settings file
    Validate {
        /// Path to settings file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
