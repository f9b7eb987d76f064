use async_trait::async_trait;

use crate::entities::ProcessedFileEntry;
use crate::error::PipelineError;
use crate::value_objects::FolderId;

/// The processed-file ledger, as consumed by the dispatch orchestrator (§4.2).
///
/// The core never deletes or updates entries through this interface; it only
/// ever reads a folder's entries once per dispatch run and inserts new ones
/// after a successful delivery.
#[async_trait]
pub trait ProcessedFileRepository: Send + Sync {
    async fn find_by_folder(&self, folder_id: FolderId) -> Result<Vec<ProcessedFileEntry>, PipelineError>;

    async fn insert(&self, entry: ProcessedFileEntry) -> Result<(), PipelineError>;
}
