//! SQLite-backed processed-file ledger (§4.2, §6). The schema mirrors the
//! columns the core requires exactly: `folder_id`, `file_name`,
//! `file_checksum`, `resend_flag`; a `processed_at` timestamp column is
//! written for operational visibility but never read back by the core.

use async_trait::async_trait;
use pipeline_flow_domain::entities::ProcessedFileEntry;
use pipeline_flow_domain::repositories::ProcessedFileRepository;
use pipeline_flow_domain::value_objects::{Checksum, FolderId};
use pipeline_flow_domain::PipelineError;
use sqlx::{Row, SqlitePool};

pub struct SqliteLedgerRepository {
    pool: SqlitePool,
}

impl SqliteLedgerRepository {
    pub async fn connect(database_url: &str) -> Result<Self, PipelineError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| PipelineError::internal_error(format!("failed to connect to ledger database: {e}")))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> Result<(), PipelineError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS processed_files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                folder_id INTEGER NOT NULL,
                file_name TEXT NOT NULL,
                file_checksum TEXT NOT NULL,
                resend_flag INTEGER NOT NULL DEFAULT 0,
                processed_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::internal_error(format!("failed to create processed_files table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_processed_files_folder_id ON processed_files(folder_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::internal_error(format!("failed to create processed_files index: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ProcessedFileRepository for SqliteLedgerRepository {
    async fn find_by_folder(&self, folder_id: FolderId) -> Result<Vec<ProcessedFileEntry>, PipelineError> {
        let rows = sqlx::query("SELECT file_name, file_checksum, resend_flag FROM processed_files WHERE folder_id = ?")
            .bind(folder_id.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::internal_error(format!("failed to query processed_files: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let file_name: String = row.get("file_name");
                let checksum_hex: String = row.get("file_checksum");
                let resend_flag: bool = row.get("resend_flag");
                let checksum = Checksum::new(checksum_hex)?;
                Ok(ProcessedFileEntry::new(folder_id, file_name, checksum, resend_flag))
            })
            .collect()
    }

    async fn insert(&self, entry: ProcessedFileEntry) -> Result<(), PipelineError> {
        sqlx::query("INSERT INTO processed_files (folder_id, file_name, file_checksum, resend_flag) VALUES (?, ?, ?, ?)")
            .bind(entry.folder_id.value())
            .bind(&entry.file_name)
            .bind(entry.file_checksum.as_str())
            .bind(entry.resend_flag)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::internal_error(format!("failed to insert processed_files row: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory() -> SqliteLedgerRepository {
        SqliteLedgerRepository::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn round_trips_an_entry() {
        let repo = in_memory().await;
        let checksum = Checksum::new("d41d8cd98f00b204e9800998ecf8427e").unwrap();
        let entry = ProcessedFileEntry::new(FolderId::new(7), "/in/a.edi", checksum.clone(), false);
        repo.insert(entry).await.unwrap();

        let found = repo.find_by_folder(FolderId::new(7)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_checksum, checksum);
        assert!(!found[0].resend_flag);
    }

    #[tokio::test]
    async fn a_different_folder_sees_no_entries() {
        let repo = in_memory().await;
        let checksum = Checksum::new("d41d8cd98f00b204e9800998ecf8427e").unwrap();
        repo.insert(ProcessedFileEntry::new(FolderId::new(1), "/in/a.edi", checksum, false)).await.unwrap();

        let found = repo.find_by_folder(FolderId::new(2)).await.unwrap();
        assert!(found.is_empty());
    }
}
