//! Send manager (C5, §4.5): fans a file out to every enabled backend of a
//! folder configuration and aggregates the per-backend [`SendResult`]s.

use std::collections::HashMap;
use std::sync::Arc;

use pipeline_flow_domain::{services::SendBackend, BackendKind, FolderConfiguration, PipelineError};

pub use pipeline_flow_domain::services::SendResult;

/// Aggregate outcome of attempting every enabled backend for one file.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub results: Vec<SendResult>,
}

impl SendOutcome {
    /// All enabled backends succeeded. A folder with no enabled backend at
    /// all vacuously succeeds - there was nothing to fail.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}

/// Constructed with a name-to-backend map so the manager never special-cases
/// a specific backend; `copy`/`ftp`/`email`/`mock` all implement the same
/// [`SendBackend`] contract.
pub struct SendManager {
    backends: HashMap<&'static str, Arc<dyn SendBackend>>,
}

impl SendManager {
    pub fn new(backends: Vec<Arc<dyn SendBackend>>) -> Self {
        Self {
            backends: backends.into_iter().map(|b| (b.name(), b)).collect(),
        }
    }

    /// Invokes every backend `folder` has enabled against `file_path`. Does
    /// not abort on a single backend failure - every enabled backend is
    /// attempted regardless of earlier outcomes.
    pub async fn send(&self, folder: &FolderConfiguration, file_path: &str) -> SendOutcome {
        let mut results = Vec::new();
        for kind in folder.enabled_backends() {
            match self.backends.get(kind.name()) {
                Some(backend) => results.push(backend.send(folder, file_path).await),
                None => results.push(SendResult::failed(kind.name(), "", format!("no backend registered for \"{}\"", kind.name()))),
            }
        }
        SendOutcome { results }
    }

    /// Checks required fields per enabled backend (e.g. `copy_to_directory`
    /// must be non-empty when `copy` is enabled), without attempting a send.
    pub fn validate(&self, folder: &FolderConfiguration) -> Vec<String> {
        let mut errors = Vec::new();
        for kind in folder.enabled_backends() {
            match self.backends.get(kind.name()) {
                Some(backend) => {
                    if let Err(error) = backend.validate(folder) {
                        errors.push(error.to_string());
                    }
                }
                None => errors.push(format!("no backend registered for \"{}\"", kind.name())),
            }
        }
        errors
    }
}

/// Used only to keep `BackendKind` imported where callers construct a
/// manager from the closed backend set rather than an ad hoc string.
pub fn all_backend_kinds() -> [BackendKind; 3] {
    BackendKind::ALL
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct AlwaysOk;
    struct AlwaysFail;

    #[async_trait]
    impl SendBackend for AlwaysOk {
        fn name(&self) -> &'static str {
            "copy"
        }
        async fn send(&self, _folder: &FolderConfiguration, file_path: &str) -> SendResult {
            SendResult::ok("copy", file_path)
        }
        fn validate(&self, _folder: &FolderConfiguration) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[async_trait]
    impl SendBackend for AlwaysFail {
        fn name(&self) -> &'static str {
            "ftp"
        }
        async fn send(&self, _folder: &FolderConfiguration, file_path: &str) -> SendResult {
            SendResult::failed("ftp", file_path, "connection refused")
        }
        fn validate(&self, _folder: &FolderConfiguration) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn folder_with(copy: bool, ftp: bool) -> FolderConfiguration {
        use pipeline_flow_domain::entities::SourceConfig;
        FolderConfiguration {
            folder_id: 1i64.into(),
            alias: "test".to_string(),
            source: SourceConfig::Local { base_path: "/tmp".to_string() },
            path: "/tmp".to_string(),
            process_backend_copy: copy,
            process_backend_ftp: ftp,
            process_backend_email: false,
            copy_to_directory: Some("/tmp/out".to_string()),
            ftp_destination: None,
            email_destination: None,
            edi: Default::default(),
        }
    }

    #[tokio::test]
    async fn all_succeeded_when_every_enabled_backend_succeeds() {
        let manager = SendManager::new(vec![Arc::new(AlwaysOk)]);
        let outcome = manager.send(&folder_with(true, false), "/tmp/in/file.txt").await;
        assert!(outcome.all_succeeded());
    }

    #[tokio::test]
    async fn one_failure_marks_outcome_as_not_all_succeeded() {
        let manager = SendManager::new(vec![Arc::new(AlwaysOk), Arc::new(AlwaysFail)]);
        let outcome = manager.send(&folder_with(true, true), "/tmp/in/file.txt").await;
        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn no_enabled_backends_vacuously_succeeds() {
        let manager = SendManager::new(vec![Arc::new(AlwaysOk)]);
        let outcome = manager.send(&folder_with(false, false), "/tmp/in/file.txt").await;
        assert!(outcome.all_succeeded());
        assert!(outcome.results.is_empty());
    }
}
