// /////////////////////////////////////////////////////////////////////////////
// Pipeline Flow Engine
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Entry point** - Application lifecycle management
//! - **Signal handling** - Graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Argument parsing** - Secure CLI argument validation
//! - **Error handling** - Process exit code mapping
//! - **Async coordination** - Shutdown coordination and cancellation
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Module)            │
//! │  - Entry Point                              │
//! │  - Signal Handling                          │
//! │  - Secure Arg Parsing                       │
//! │  - Exit Code Mapping                        │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER                   │
//! │  - Use Cases (run, dispatch)                │
//! │  - Application Services                     │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           DOMAIN LAYER                      │
//! │  - Business Logic                           │
//! │  - Domain Services                          │
//! │  - Entities & Value Objects                 │
//! └─────────────────────────────────────────────┘
//!                      ▲
//!                      │
//! ┌─────────────────────────────────────────────┐
//! │       INFRASTRUCTURE LAYER                  │
//! │  - Adapters (remote filesystems, send)      │
//! │  - Repositories (ledger)                    │
//! │  - Configuration, Logging                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from Enterprise Layers**
//!    - Bootstrap can access all layers
//!    - Enterprise layers cannot access bootstrap
//!    - Clear architectural boundary
//!
//! 2. **Graceful Shutdown**
//!    - Signal handlers (SIGTERM, SIGINT, SIGHUP)
//!    - Cancellation token propagation
//!    - Grace period with timeout enforcement
//!
//! 3. **Security First**
//!    - Input validation for all arguments
//!    - Path traversal prevention
//!    - Injection attack protection
//!
//! ## Module Structure
//!
//! - `cli` - Secure argument parsing (`run`/`dispatch` subcommands)
//! - `exit_code` - Process exit code mapping
//! - `logger` - Bootstrap-specific logging
//! - `shutdown` - Shutdown coordination
//! - `signals` - Signal handling (SIGTERM, SIGINT, SIGHUP)

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Bootstrap entry point: parse and security-validate CLI arguments.
///
/// The caller is responsible for running the selected use case and mapping
/// its `Result` to an exit code with [`result_to_exit_code`].
///
/// # Example
///
/// ```no_run
/// use pipeline_flow_bootstrap::{bootstrap_cli, result_to_exit_code, ValidatedCommand};
/// use pipeline_flow_domain::PipelineError;
///
/// #[tokio::main]
/// async fn main() {
///     let validated_cli = match bootstrap_cli() {
///         Ok(cli) => cli,
///         Err(e) => {
///             eprintln!("CLI error: {e}");
///             std::process::exit(2);
///         }
///     };
///
///     let result: Result<(), PipelineError> = match validated_cli.command {
///         ValidatedCommand::Run { .. } => Ok(()),
///         ValidatedCommand::Dispatch { .. } => Ok(()),
///     };
///
///     std::process::exit(result_to_exit_code(&result).as_i32());
/// }
/// ```
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
