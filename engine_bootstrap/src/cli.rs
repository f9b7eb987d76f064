// /////////////////////////////////////////////////////////////////////////////
// Pipeline Flow Engine
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()             │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::SecureArgParser      │  Path/argument validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands, LogFormatArg};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration: every path has been checked for shell
/// metacharacters and directory traversal, and every path expected to
/// already exist has been canonicalized.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub config: Option<PathBuf>,
    pub log_format: Option<LogFormatArg>,
    pub verbose: u8,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        pipeline: PathBuf,
        input: PathBuf,
        output: PathBuf,
    },
    Dispatch {
        folders: PathBuf,
        force_edi_validation: bool,
    },
}

/// Parses CLI arguments with `clap` and runs every resulting path and
/// string argument through [`SecureArgParser`].
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = match &cli.config {
        Some(path) => Some(SecureArgParser::validate_path(&path.to_string_lossy())?),
        None => None,
    };

    let command = match cli.command {
        Commands::Run { pipeline, input, output } => {
            let pipeline = SecureArgParser::validate_path(&pipeline.to_string_lossy())?;
            let input = SecureArgParser::validate_path(&input.to_string_lossy())?;
            SecureArgParser::validate_argument(&output.to_string_lossy())?;
            ValidatedCommand::Run { pipeline, input, output }
        }
        Commands::Dispatch { folders, force_edi_validation } => {
            let folders = SecureArgParser::validate_path(&folders.to_string_lossy())?;
            ValidatedCommand::Dispatch { folders, force_edi_validation }
        }
    };

    Ok(ValidatedCli {
        command,
        config,
        log_format: cli.log_format,
        verbose: cli.verbose,
        quiet: cli.quiet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_command_rejects_nonexistent_pipeline_path() {
        let cli = Cli {
            command: Commands::Run {
                pipeline: PathBuf::from("/nonexistent/pipeline.json"),
                input: PathBuf::from("/tmp"),
                output: PathBuf::from("/tmp/out"),
            },
            config: None,
            log_format: None,
            verbose: 0,
            quiet: false,
        };
        assert!(validate_cli(cli).is_err());
    }
}
