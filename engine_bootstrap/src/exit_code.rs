//! Maps a [`PipelineError`] category onto a process exit code (§10.2), so
//! `main` can translate a `Result` from either use case into
//! `std::process::exit`.

use pipeline_flow_domain::PipelineError;

/// Process exit codes. Values are stable - scripts invoking this binary may
/// branch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Completed without error.
    Success = 0,
    /// Malformed pipeline/folder configuration, unknown node type, unknown
    /// remote-FS protocol, missing required backend field, a rejected DAG.
    Config = 2,
    /// Remote filesystem or local disk failure.
    Io = 3,
    /// EDI structural validation failure.
    Validation = 4,
    /// A node handler failed during execution.
    Handler = 5,
    /// Shutdown requested mid-run (SIGTERM/SIGINT) or grace period expired.
    Cancelled = 130,
    /// Anything else - internal invariant violation, resource exhaustion,
    /// timeout with no more attempts left.
    Internal = 1,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Categorizes a [`PipelineError`] into its [`ExitCode`].
pub fn map_error_to_exit_code(error: &PipelineError) -> ExitCode {
    match error {
        PipelineError::InvalidConfiguration(_) | PipelineError::UnknownNodeType(_) | PipelineError::MissingBackendField(_) | PipelineError::CycleDetected(_) | PipelineError::PipelineNotFound(_) => ExitCode::Config,
        PipelineError::IoError(_) => ExitCode::Io,
        PipelineError::ValidationError(_) => ExitCode::Validation,
        PipelineError::HandlerFailed(_) | PipelineError::ExpressionError(_) => ExitCode::Handler,
        PipelineError::Cancelled(_) => ExitCode::Cancelled,
        PipelineError::ResourceExhausted(_) | PipelineError::TimeoutError(_) | PipelineError::InternalError(_) => ExitCode::Internal,
    }
}

/// Turns a use case's final `Result` into the exit code `main` should use,
/// logging nothing itself - callers are expected to have already logged the
/// error via `tracing`.
pub fn result_to_exit_code<T>(result: &Result<T, PipelineError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(error) => map_error_to_exit_code(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_config_exit_code() {
        let error = PipelineError::cycle_detected("a -> b -> a");
        assert_eq!(map_error_to_exit_code(&error), ExitCode::Config);
    }

    #[test]
    fn io_errors_map_to_io_exit_code() {
        let error = PipelineError::io_error("connection refused");
        assert_eq!(map_error_to_exit_code(&error), ExitCode::Io);
    }

    #[test]
    fn ok_result_maps_to_success() {
        let result: Result<(), PipelineError> = Ok(());
        assert_eq!(result_to_exit_code(&result), ExitCode::Success);
    }
}
