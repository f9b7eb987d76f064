//! SMB `RemoteFileSystem` over `pavao`'s libsmbclient bindings (§4.1).
//! `SmbClient` is blocking, so every call runs via `block_in_place` on the
//! current worker thread, mirroring the SFTP adapter.

use std::io::{Read, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use pavao::{SmbClient, SmbCredentials, SmbDirentType, SmbMode, SmbOpenOptions, SmbOptions};
use pipeline_flow_domain::services::{RemoteEntry, RemoteFileSystem};
use pipeline_flow_domain::PipelineError;

pub struct SmbFileSystem {
    client: Mutex<SmbClient>,
}

impl SmbFileSystem {
    pub fn new(host: String, share: String, username: String, password: String, port: u16) -> Result<Self, PipelineError> {
        let credentials = SmbCredentials::default()
            .server(format!("smb://{host}:{port}"))
            .share(format!("/{share}"))
            .username(username)
            .password(password);
        let client = SmbClient::new(credentials, SmbOptions::default().case_sensitive(false).one_share_per_server(true))
            .map_err(|e| PipelineError::io_error(format!("smb connect failed: {e}")))?;
        Ok(Self { client: Mutex::new(client) })
    }

    fn client(&self) -> std::sync::MutexGuard<'_, SmbClient> {
        self.client.lock().unwrap()
    }
}

#[async_trait]
impl RemoteFileSystem for SmbFileSystem {
    async fn list(&self, path: &str) -> Vec<RemoteEntry> {
        let path = path.to_string();
        tokio::task::block_in_place(|| {
            let client = self.client();
            let Ok(dirents) = client.list_dir(&path) else {
                return Vec::new();
            };
            let mut entries: Vec<RemoteEntry> = dirents
                .into_iter()
                .filter(|d| d.get_type() == SmbDirentType::File || d.get_type() == SmbDirentType::Dir)
                .map(|d| {
                    let full_path = format!("{}/{}", path.trim_end_matches('/'), d.name());
                    let size = client.stat(&full_path).map(|s| s.size as u64).unwrap_or(0);
                    RemoteEntry {
                        name: d.name().to_string(),
                        size,
                        modified: Utc::now(),
                    }
                })
                .collect();
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            entries
        })
    }

    async fn exists_file(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.client().stat(&path).map(|s| !s.is_dir()).unwrap_or(false))
    }

    async fn exists_dir(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.client().stat(&path).map(|s| s.is_dir()).unwrap_or(false))
    }

    async fn stat(&self, path: &str) -> Option<RemoteEntry> {
        let path = path.to_string();
        tokio::task::block_in_place(|| {
            let client = self.client();
            let stat = client.stat(&path).ok()?;
            let name = path.rsplit('/').next().unwrap_or(&path).to_string();
            Some(RemoteEntry {
                name,
                size: stat.size as u64,
                modified: Utc::now(),
            })
        })
    }

    async fn download(&self, remote: &str, local: &str) -> bool {
        let remote = remote.to_string();
        let local = local.to_string();
        tokio::task::block_in_place(|| {
            let client = self.client();
            let Ok(mut file) = client.open_with(&remote, SmbOpenOptions::default().read(true)) else {
                return false;
            };
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).is_ok() && std::fs::write(&local, buf).is_ok()
        })
    }

    async fn upload(&self, local: &str, remote: &str) -> bool {
        let Ok(bytes) = std::fs::read(local) else {
            return false;
        };
        let remote = remote.to_string();
        tokio::task::block_in_place(|| {
            let client = self.client();
            let Ok(mut file) = client.open_with(&remote, SmbOpenOptions::default().create(true).write(true).mode(SmbMode::from(0o644))) else {
                return false;
            };
            file.write_all(&bytes).is_ok()
        })
    }

    async fn delete_file(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.client().unlink(&path).is_ok())
    }

    async fn mkdir(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.client().mkdir(&path, SmbMode::from(0o755)).is_ok())
    }

    async fn rmdir(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.client().rmdir(&path).is_ok())
    }

    async fn upload_dir(&self, local_dir: &str, remote_dir: &str) -> bool {
        let Ok(read_dir) = std::fs::read_dir(local_dir) else {
            return false;
        };
        if !self.mkdir(remote_dir).await {
            return false;
        }
        for entry in read_dir.flatten() {
            let local_path = entry.path();
            let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), entry.file_name().to_string_lossy());
            let ok = if local_path.is_dir() {
                Box::pin(self.upload_dir(&local_path.to_string_lossy(), &remote_path)).await
            } else {
                self.upload(&local_path.to_string_lossy(), &remote_path).await
            };
            if !ok {
                return false;
            }
        }
        true
    }

    async fn download_dir(&self, remote_dir: &str, local_dir: &str) -> bool {
        if tokio::fs::create_dir_all(local_dir).await.is_err() {
            return false;
        }
        for entry in self.list(remote_dir).await {
            let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), entry.name);
            let local_path = format!("{}/{}", local_dir.trim_end_matches('/'), entry.name);
            let ok = if self.exists_dir(&remote_path).await {
                Box::pin(self.download_dir(&remote_path, &local_path)).await
            } else {
                self.download(&remote_path, &local_path).await
            };
            if !ok {
                return false;
            }
        }
        true
    }

    async fn hash(&self, path: &str, algo: &str) -> Result<String, PipelineError> {
        let remote = path.to_string();
        let bytes = tokio::task::block_in_place(|| {
            let client = self.client();
            let mut file = client
                .open_with(&remote, SmbOpenOptions::default().read(true))
                .map_err(|e| PipelineError::io_error(format!("smb open failed: {e}")))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).map_err(PipelineError::from)?;
            Ok::<_, PipelineError>(buf)
        })?;
        crate::application::utilities::hash::hash_bytes(&bytes, algo)
    }

    async fn close(&self) {}
}
