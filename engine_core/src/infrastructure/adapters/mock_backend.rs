//! `mock` send backend: always succeeds without touching any external
//! system. Not registered by the production [`SendManager`](crate::application::services::send_manager::SendManager)
//! wiring in `main.rs`; useful for dry runs and integration tests that want
//! a real [`SendBackend`] object without a live FTP/SMTP server.

use async_trait::async_trait;
use pipeline_flow_domain::entities::FolderConfiguration;
use pipeline_flow_domain::services::{SendBackend, SendResult};
use pipeline_flow_domain::PipelineError;

pub struct MockBackend {
    name: &'static str,
}

impl MockBackend {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl SendBackend for MockBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, _folder: &FolderConfiguration, file_path: &str) -> SendResult {
        SendResult::ok(self.name, format!("mock:{file_path}"))
    }

    fn validate(&self, _folder: &FolderConfiguration) -> Result<(), PipelineError> {
        Ok(())
    }
}
