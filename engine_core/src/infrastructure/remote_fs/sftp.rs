//! SFTP `RemoteFileSystem` over `ssh2` (§4.1). `ssh2` is a blocking API, so
//! every call is dispatched through `spawn_blocking`; the session itself is
//! established once, lazily, and held behind a mutex for the adapter's
//! lifetime rather than reconnected per operation.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipeline_flow_domain::services::{RemoteEntry, RemoteFileSystem};
use pipeline_flow_domain::PipelineError;
use ssh2::Session;

pub struct SftpFileSystem {
    host: String,
    port: u16,
    username: String,
    password: String,
    private_key_path: Option<String>,
    session: Mutex<Option<Session>>,
}

impl SftpFileSystem {
    pub fn new(host: String, port: u16, username: String, password: String, private_key_path: Option<String>) -> Self {
        Self {
            host,
            port,
            username,
            password,
            private_key_path,
            session: Mutex::new(None),
        }
    }

    fn connect(&self) -> Result<Session, PipelineError> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port)).map_err(PipelineError::from)?;
        let mut session = Session::new().map_err(|e| PipelineError::io_error(format!("sftp session init failed: {e}")))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| PipelineError::io_error(format!("sftp handshake failed: {e}")))?;

        match &self.private_key_path {
            Some(key_path) => session
                .userauth_pubkey_file(&self.username, None, Path::new(key_path), None)
                .map_err(|e| PipelineError::io_error(format!("sftp key auth failed: {e}")))?,
            None => session
                .userauth_password(&self.username, &self.password)
                .map_err(|e| PipelineError::io_error(format!("sftp password auth failed: {e}")))?,
        }
        Ok(session)
    }

    /// Returns a handle to the session, establishing it on first use.
    fn session(&self) -> Result<(), PipelineError> {
        let mut guard = self.session.lock().unwrap();
        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        Ok(())
    }

    fn with_sftp<T>(&self, f: impl FnOnce(&ssh2::Sftp) -> Result<T, PipelineError>) -> Result<T, PipelineError> {
        self.session()?;
        let guard = self.session.lock().unwrap();
        let session = guard.as_ref().expect("session established above");
        let sftp = session.sftp().map_err(|e| PipelineError::io_error(format!("sftp channel failed: {e}")))?;
        f(&sftp)
    }
}

#[async_trait]
impl RemoteFileSystem for SftpFileSystem {
    async fn list(&self, path: &str) -> Vec<RemoteEntry> {
        let path = path.to_string();
        // `ssh2::Session` is not `Send`, so operations run via
        // `block_in_place` on the current worker thread rather than through
        // `spawn_blocking`, which would require moving the session across
        // threads.
        tokio::task::block_in_place(|| {
            self.with_sftp(|sftp| {
                let mut entries = Vec::new();
                let listing = sftp.readdir(Path::new(&path)).map_err(|e| PipelineError::io_error(e.to_string()))?;
                for (entry_path, stat) in listing {
                    let name = entry_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                    let modified = stat
                        .mtime
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
                        .unwrap_or_else(Utc::now);
                    entries.push(RemoteEntry {
                        name,
                        size: stat.size.unwrap_or(0),
                        modified,
                    });
                }
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(entries)
            })
        })
        .unwrap_or_default()
    }

    async fn exists_file(&self, path: &str) -> bool {
        self.stat(path).await.is_some()
    }

    async fn exists_dir(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.with_sftp(|sftp| Ok(sftp.stat(Path::new(&path)).map(|s| s.is_dir()).unwrap_or(false)))).unwrap_or(false)
    }

    async fn stat(&self, path: &str) -> Option<RemoteEntry> {
        let path = path.to_string();
        tokio::task::block_in_place(|| {
            self.with_sftp(|sftp| {
                let stat = sftp.stat(Path::new(&path)).map_err(|e| PipelineError::io_error(e.to_string()))?;
                let name = Path::new(&path).file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                let modified = stat
                    .mtime
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
                    .unwrap_or_else(Utc::now);
                Ok(RemoteEntry {
                    name,
                    size: stat.size.unwrap_or(0),
                    modified,
                })
            })
        })
        .ok()
    }

    async fn download(&self, remote: &str, local: &str) -> bool {
        let remote = remote.to_string();
        let local = local.to_string();
        tokio::task::block_in_place(|| {
            self.with_sftp(|sftp| {
                let mut remote_file = sftp.open(Path::new(&remote)).map_err(|e| PipelineError::io_error(e.to_string()))?;
                let mut buf = Vec::new();
                remote_file.read_to_end(&mut buf).map_err(PipelineError::from)?;
                std::fs::write(&local, buf).map_err(PipelineError::from)?;
                Ok(())
            })
        })
        .is_ok()
    }

    async fn upload(&self, local: &str, remote: &str) -> bool {
        let local = local.to_string();
        let remote = remote.to_string();
        tokio::task::block_in_place(|| {
            self.with_sftp(|sftp| {
                let bytes = std::fs::read(&local).map_err(PipelineError::from)?;
                let mut remote_file = sftp.create(Path::new(&remote)).map_err(|e| PipelineError::io_error(e.to_string()))?;
                remote_file.write_all(&bytes).map_err(PipelineError::from)?;
                Ok(())
            })
        })
        .is_ok()
    }

    async fn delete_file(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.with_sftp(|sftp| sftp.unlink(Path::new(&path)).map_err(|e| PipelineError::io_error(e.to_string())))).is_ok()
    }

    async fn mkdir(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.with_sftp(|sftp| sftp.mkdir(Path::new(&path), 0o755).map_err(|e| PipelineError::io_error(e.to_string())))).is_ok()
    }

    async fn rmdir(&self, path: &str) -> bool {
        let path = path.to_string();
        tokio::task::block_in_place(|| self.with_sftp(|sftp| sftp.rmdir(Path::new(&path)).map_err(|e| PipelineError::io_error(e.to_string())))).is_ok()
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
            if local_path.is_dir() {
                if !Box::pin(self.upload_dir(&local_path.to_string_lossy(), &remote_path)).await {
                    return false;
                }
            } else if !self.upload(&local_path.to_string_lossy(), &remote_path).await {
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
            if self.exists_dir(&remote_path).await {
                if !Box::pin(self.download_dir(&remote_path, &local_path)).await {
                    return false;
                }
            } else if !self.download(&remote_path, &local_path).await {
                return false;
            }
        }
        true
    }

    async fn hash(&self, path: &str, algo: &str) -> Result<String, PipelineError> {
        let remote = path.to_string();
        let bytes = tokio::task::block_in_place(|| {
            self.with_sftp(|sftp| {
                let mut remote_file = sftp.open(Path::new(&remote)).map_err(|e| PipelineError::io_error(e.to_string()))?;
                let mut buf = Vec::new();
                remote_file.read_to_end(&mut buf).map_err(PipelineError::from)?;
                Ok(buf)
            })
        })?;
        crate::application::utilities::hash::hash_bytes(&bytes, algo)
    }

    async fn close(&self) {
        let mut guard = self.session.lock().unwrap();
        *guard = None;
    }
}
