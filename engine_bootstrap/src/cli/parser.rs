//! CLI structure and `clap` parsing (§6, §10.2 global flags).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pipeline-flow", version, about = "Batch file-processing pipeline engine: DAG executor and dispatch orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the default configuration search path.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Increase log verbosity. Repeatable (-v, -vv, -vvv).
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error-level output.
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single pipeline description end to end (C8).
    Run {
        /// Path to the pipeline description JSON file.
        #[arg(long)]
        pipeline: PathBuf,
        /// Default input path used by `folderSource`/`readJson`/`readExcel`
        /// nodes that don't specify a remote protocol.
        #[arg(long)]
        input: PathBuf,
        /// Default output path used by `output`/`writeJson`/`writeExcel`
        /// nodes that don't specify a remote protocol.
        #[arg(long)]
        output: PathBuf,
    },
    /// Dispatch every configured source folder (C6).
    Dispatch {
        /// Path to the folder-configuration JSON file (an array of folder
        /// configurations, §6).
        #[arg(long)]
        folders: PathBuf,
        /// Treat every folder's EDI validation failures as non-fatal,
        /// overriding each folder's own `force_edi_validation` flag.
        #[arg(long, default_value_t = false)]
        force_edi_validation: bool,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
