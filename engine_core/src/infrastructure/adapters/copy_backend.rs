//! `copy` send backend (§4.5): copies the delivered file to a local
//! directory. The simplest backend, and the one every dispatch example in
//! §8 exercises.

use async_trait::async_trait;
use pipeline_flow_domain::entities::FolderConfiguration;
use pipeline_flow_domain::services::{SendBackend, SendResult};
use pipeline_flow_domain::PipelineError;

pub struct CopyBackend;

#[async_trait]
impl SendBackend for CopyBackend {
    fn name(&self) -> &'static str {
        "copy"
    }

    async fn send(&self, folder: &FolderConfiguration, file_path: &str) -> SendResult {
        let Some(directory) = &folder.copy_to_directory else {
            return SendResult::failed("copy", "", "copy_to_directory not configured");
        };
        if tokio::fs::create_dir_all(directory).await.is_err() {
            return SendResult::failed("copy", directory, format!("could not create {directory}"));
        }
        let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
        let destination = format!("{}/{}", directory.trim_end_matches('/'), file_name);
        match tokio::fs::copy(file_path, &destination).await {
            Ok(_) => SendResult::ok("copy", destination),
            Err(error) => SendResult::failed("copy", destination, error.to_string()),
        }
    }

    fn validate(&self, folder: &FolderConfiguration) -> Result<(), PipelineError> {
        match &folder.copy_to_directory {
            Some(dir) if !dir.trim().is_empty() => Ok(()),
            _ => Err(PipelineError::missing_backend_field("copy backend enabled without copy_to_directory")),
        }
    }
}
