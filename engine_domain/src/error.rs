// /////////////////////////////////////////////////////////////////////////////
// Pipeline Flow Engine
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single, hierarchical error type for the whole engine. Every fallible
//! domain operation returns `Result<T, PipelineError>` so callers at the
//! executor and orchestrator boundary can categorize a failure without
//! downcasting.
//!
//! ## Error Categories
//!
//! - **Configuration**: malformed pipeline description, unknown node type,
//!   unknown remote-FS protocol, missing required backend field.
//! - **Graph**: cycle detection and other structural DAG violations.
//! - **I/O**: remote-FS operation failure, file not found, permission denied.
//! - **Validation**: EDI structural violations.
//! - **Handler logic**: expression evaluation failure, type mismatch in a
//!   comparator — recorded per-record, never fatal on their own.
//! - **System**: cancellation, internal invariant violations.

use thiserror::Error;

/// Domain-specific errors for the pipeline engine.
///
/// Each variant carries a descriptive message. Constructors below exist so
/// call sites read as intent (`PipelineError::unknown_node_type(...)`)
/// rather than as raw enum construction.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Cycle detected in pipeline graph: {0}")]
    CycleDetected(String),

    #[error("Missing required backend field: {0}")]
    MissingBackendField(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("EDI validation error: {0}")]
    ValidationError(String),

    #[error("Expression evaluation error: {0}")]
    ExpressionError(String),

    #[error("Node handler failed: {0}")]
    HandlerFailed(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unknown_node_type(msg: impl Into<String>) -> Self {
        Self::UnknownNodeType(msg.into())
    }

    pub fn cycle_detected(msg: impl Into<String>) -> Self {
        Self::CycleDetected(msg.into())
    }

    pub fn missing_backend_field(msg: impl Into<String>) -> Self {
        Self::MissingBackendField(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn expression_error(msg: impl Into<String>) -> Self {
        Self::ExpressionError(msg.into())
    }

    pub fn handler_failed(msg: impl Into<String>) -> Self {
        Self::HandlerFailed(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether the failure represents a transient condition worth retrying.
    ///
    /// Used by the retry helper (see `pipeline-flow`'s `application::utilities::retry`)
    /// to decide whether to attempt another pass rather than surface immediately.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::TimeoutError(_) | PipelineError::ResourceExhausted(_) | PipelineError::IoError(_)
        )
    }

    /// Whether this error is fatal to the enclosing pipeline or dispatch run,
    /// as opposed to a per-record/per-file error that gets accumulated.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidConfiguration(_)
                | PipelineError::UnknownNodeType(_)
                | PipelineError::CycleDetected(_)
                | PipelineError::MissingBackendField(_)
                | PipelineError::HandlerFailed(_)
                | PipelineError::Cancelled(_)
                | PipelineError::PipelineNotFound(_)
                | PipelineError::InternalError(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::InvalidConfiguration(_) => "configuration",
            PipelineError::UnknownNodeType(_) => "configuration",
            PipelineError::CycleDetected(_) => "graph",
            PipelineError::MissingBackendField(_) => "configuration",
            PipelineError::IoError(_) => "io",
            PipelineError::ValidationError(_) => "validation",
            PipelineError::ExpressionError(_) => "handler_logic",
            PipelineError::HandlerFailed(_) => "processing",
            PipelineError::ResourceExhausted(_) => "resource",
            PipelineError::TimeoutError(_) => "timeout",
            PipelineError::Cancelled(_) => "cancellation",
            PipelineError::PipelineNotFound(_) => "pipeline",
            PipelineError::InternalError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::InvalidConfiguration(err.to_string())
    }
}

// NOTE: format-specific (TOML/YAML) conversions intentionally live in the
// infrastructure layer, not here - serialization format choice is an
// infrastructure concern, not a domain one.
