use async_trait::async_trait;

use crate::entities::FolderConfiguration;
use crate::error::PipelineError;

/// Per-backend outcome of attempting to send one file (§3, §4.5).
#[derive(Debug, Clone)]
pub struct SendResult {
    pub backend_name: String,
    pub success: bool,
    pub destination: String,
    pub error_text: Option<String>,
}

impl SendResult {
    pub fn ok(backend_name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            backend_name: backend_name.into(),
            success: true,
            destination: destination.into(),
            error_text: None,
        }
    }

    pub fn failed(backend_name: impl Into<String>, destination: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            backend_name: backend_name.into(),
            success: false,
            destination: destination.into(),
            error_text: Some(error.into()),
        }
    }
}

/// A pluggable delivery backend (§4.5): one of `copy`, `ftp`, `email`, plus a
/// `mock` implementation used in tests. All implementations share this
/// contract so the send manager can be constructed with a name-to-backend
/// map and never special-case a specific backend.
#[async_trait]
pub trait SendBackend: Send + Sync {
    /// The name this backend is registered under (`"copy"`, `"ftp"`, ...).
    fn name(&self) -> &'static str;

    /// Sends `file_path` according to `folder`'s configuration.
    async fn send(&self, folder: &FolderConfiguration, file_path: &str) -> SendResult;

    /// Checks that `folder` carries whatever fields this backend requires
    /// when enabled (e.g. `copy_to_directory` non-empty for `copy`).
    fn validate(&self, folder: &FolderConfiguration) -> Result<(), PipelineError>;
}
