use serde::{Deserialize, Serialize};

use crate::value_objects::{Checksum, FolderId};

/// A row of the processed-file ledger (§3, §6).
///
/// `(folder_id, content_checksum)` is the dedup key; the core never deletes
/// or updates a row once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFileEntry {
    pub folder_id: FolderId,
    pub file_name: String,
    pub file_checksum: Checksum,
    pub resend_flag: bool,
}

impl ProcessedFileEntry {
    pub fn new(folder_id: FolderId, file_name: impl Into<String>, file_checksum: Checksum, resend_flag: bool) -> Self {
        Self {
            folder_id,
            file_name: file_name.into(),
            file_checksum,
            resend_flag,
        }
    }
}
