//! Local-disk `RemoteFileSystem`, rooted at a configured `base_path` (§4.1).
//!
//! Every path handed in by a caller is joined under `base_path` rather than
//! treated as absolute, so a misconfigured folder path can't walk outside the
//! directory a folder configuration was meant to scope.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipeline_flow_domain::services::{RemoteEntry, RemoteFileSystem};
use pipeline_flow_domain::PipelineError;

pub struct LocalFileSystem {
    base_path: PathBuf,
}

impl LocalFileSystem {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = path.trim_start_matches('/');
        self.base_path.join(path)
    }

    async fn stat_path(path: &Path) -> Option<RemoteEntry> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        let name = path.file_name()?.to_string_lossy().to_string();
        let modified: DateTime<Utc> = meta.modified().ok().map(DateTime::from).unwrap_or_else(Utc::now);
        Some(RemoteEntry {
            name,
            size: meta.len(),
            modified,
        })
    }
}

#[async_trait]
impl RemoteFileSystem for LocalFileSystem {
    async fn list(&self, path: &str) -> Vec<RemoteEntry> {
        let dir = self.resolve(path);
        let mut entries = Vec::new();
        let Ok(mut read_dir) = tokio::fs::read_dir(&dir).await else {
            return entries;
        };
        while let Ok(Some(entry)) = read_dir.next_entry().await {
            if let Some(info) = Self::stat_path(&entry.path()).await {
                entries.push(info);
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    async fn exists_file(&self, path: &str) -> bool {
        tokio::fs::metadata(self.resolve(path)).await.map(|m| m.is_file()).unwrap_or(false)
    }

    async fn exists_dir(&self, path: &str) -> bool {
        tokio::fs::metadata(self.resolve(path)).await.map(|m| m.is_dir()).unwrap_or(false)
    }

    async fn stat(&self, path: &str) -> Option<RemoteEntry> {
        Self::stat_path(&self.resolve(path)).await
    }

    async fn download(&self, remote: &str, local: &str) -> bool {
        tokio::fs::copy(self.resolve(remote), local).await.is_ok()
    }

    async fn upload(&self, local: &str, remote: &str) -> bool {
        tokio::fs::copy(local, self.resolve(remote)).await.is_ok()
    }

    async fn delete_file(&self, path: &str) -> bool {
        tokio::fs::remove_file(self.resolve(path)).await.is_ok()
    }

    async fn mkdir(&self, path: &str) -> bool {
        tokio::fs::create_dir_all(self.resolve(path)).await.is_ok()
    }

    async fn rmdir(&self, path: &str) -> bool {
        tokio::fs::remove_dir_all(self.resolve(path)).await.is_ok()
    }

    async fn upload_dir(&self, local_dir: &str, remote_dir: &str) -> bool {
        copy_dir_recursive(Path::new(local_dir), &self.resolve(remote_dir)).await.is_ok()
    }

    async fn download_dir(&self, remote_dir: &str, local_dir: &str) -> bool {
        copy_dir_recursive(&self.resolve(remote_dir), Path::new(local_dir)).await.is_ok()
    }

    async fn hash(&self, path: &str, algo: &str) -> Result<String, PipelineError> {
        let bytes = tokio::fs::read(self.resolve(path)).await?;
        crate::application::utilities::hash::hash_bytes(&bytes, algo)
    }

    async fn close(&self) {}
}

async fn copy_dir_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(to).await?;
    let mut entries = tokio::fs::read_dir(from).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        let dest = to.join(entry.file_name());
        if file_type.is_dir() {
            Box::pin(copy_dir_recursive(&entry.path(), &dest)).await?;
        } else {
            tokio::fs::copy(entry.path(), dest).await?;
        }
    }
    Ok(())
}
