use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PipelineError;

/// File metadata as returned by `list` and `stat` (§4.1).
///
/// `modified` is deliberately an opaque wall-clock value rather than a
/// timestamp with guaranteed semantics - SMB and FTP have historically
/// leaky behaviors here (partial listings, time fields of unknown
/// timezone), so callers must not rely on it for anything beyond display.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Uniform capability surface over {local, SMB, SFTP, FTP} storage (§4.1).
///
/// Each variant lazily establishes its connection on first operation and
/// holds it open until [`RemoteFileSystem::close`]. I/O failures on
/// individual operations do not raise; they return `false` or an empty
/// result and are logged by the implementation. `hash` is the one exception:
/// it fails with an `IoError` when the file cannot be read, because absence
/// vs read failure matters to its caller (the dispatch orchestrator).
///
/// Directory recursion walks lexicographically; symlinks are followed on
/// `local`, not followed on remote protocols (which report them as plain
/// files when they dereference).
#[async_trait]
pub trait RemoteFileSystem: Send + Sync {
    async fn list(&self, path: &str) -> Vec<RemoteEntry>;

    async fn exists_file(&self, path: &str) -> bool;

    async fn exists_dir(&self, path: &str) -> bool;

    async fn stat(&self, path: &str) -> Option<RemoteEntry>;

    async fn download(&self, remote: &str, local: &str) -> bool;

    async fn upload(&self, local: &str, remote: &str) -> bool;

    async fn delete_file(&self, path: &str) -> bool;

    async fn mkdir(&self, path: &str) -> bool;

    async fn rmdir(&self, path: &str) -> bool;

    async fn upload_dir(&self, local_dir: &str, remote_dir: &str) -> bool;

    async fn download_dir(&self, remote_dir: &str, local_dir: &str) -> bool;

    /// Hex digest of `path`'s content using `algo` (one of `md5`, `sha1`,
    /// `sha256`). Fails with `IoError` when the file cannot be read.
    async fn hash(&self, path: &str, algo: &str) -> Result<String, PipelineError>;

    async fn close(&self);
}
