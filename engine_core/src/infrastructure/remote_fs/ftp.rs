//! FTP `RemoteFileSystem` over `suppaftp`'s tokio-native-tls client (§4.1).
//! TLS is attempted first when `use_tls` is set; per §4.1 there is no
//! fallback to plaintext on a TLS handshake failure, only on `use_tls: false`
//! explicitly configured.

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use pipeline_flow_domain::services::{RemoteEntry, RemoteFileSystem};
use pipeline_flow_domain::PipelineError;
use suppaftp::AsyncNativeTlsFtpStream;
use tokio::io::AsyncReadExt;

pub struct FtpFileSystem {
    host: String,
    port: u16,
    username: String,
    password: String,
    use_tls: bool,
    stream: Mutex<Option<AsyncNativeTlsFtpStream>>,
}

impl FtpFileSystem {
    pub fn new(host: String, port: u16, username: String, password: String, use_tls: bool) -> Self {
        Self {
            host,
            port,
            username,
            password,
            use_tls,
            stream: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<AsyncNativeTlsFtpStream, PipelineError> {
        let mut stream = AsyncNativeTlsFtpStream::connect(format!("{}:{}", self.host, self.port))
            .await
            .map_err(|e| PipelineError::io_error(format!("ftp connect failed: {e}")))?;
        if self.use_tls {
            stream = stream
                .into_secure(suppaftp::native_tls::TlsConnector::new().map_err(|e| PipelineError::io_error(e.to_string()))?.into(), &self.host)
                .await
                .map_err(|e| PipelineError::io_error(format!("ftp tls upgrade failed: {e}")))?;
        }
        stream
            .login(&self.username, &self.password)
            .await
            .map_err(|e| PipelineError::io_error(format!("ftp login failed: {e}")))?;
        Ok(stream)
    }

    /// Runs `f` against a connected stream, establishing the connection on
    /// first use and reusing it afterward. A taken-but-errored operation
    /// leaves the connection in place; reconnecting is left to the next
    /// dispatch run rather than retried inline here - that's the job of the
    /// orchestrator's own retry policy around the filesystem, not the
    /// filesystem itself.
    async fn with_stream<T, F, Fut>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce(AsyncNativeTlsFtpStream) -> Fut,
        Fut: std::future::Future<Output = (AsyncNativeTlsFtpStream, Result<T, PipelineError>)>,
    {
        let existing = self.stream.lock().unwrap().take();
        let stream = match existing {
            Some(stream) => stream,
            None => self.connect().await?,
        };
        let (stream, result) = f(stream).await;
        *self.stream.lock().unwrap() = Some(stream);
        result
    }
}

#[async_trait]
impl RemoteFileSystem for FtpFileSystem {
    async fn list(&self, path: &str) -> Vec<RemoteEntry> {
        let path = path.to_string();
        self.with_stream(|mut stream| async move {
            let result = stream.list(Some(&path)).await;
            let entries = match result {
                Ok(lines) => lines
                    .iter()
                    .filter_map(|line| suppaftp::list::File::try_from(line.as_str()).ok())
                    .map(|file| RemoteEntry {
                        name: file.name().to_string(),
                        size: file.size() as u64,
                        modified: Utc::now(),
                    })
                    .collect(),
                Err(_) => Vec::new(),
            };
            (stream, Ok(entries))
        })
        .await
        .unwrap_or_default()
    }

    async fn exists_file(&self, path: &str) -> bool {
        self.stat(path).await.is_some()
    }

    async fn exists_dir(&self, path: &str) -> bool {
        let path = path.to_string();
        self.with_stream(|mut stream| async move {
            let exists = stream.cwd(&path).await.is_ok();
            (stream, Ok(exists))
        })
        .await
        .unwrap_or(false)
    }

    async fn stat(&self, path: &str) -> Option<RemoteEntry> {
        let path = path.to_string();
        self.with_stream(|mut stream| async move {
            let size = stream.size(&path).await.ok();
            let name = path.rsplit('/').next().unwrap_or(&path).to_string();
            let entry = size.map(|size| RemoteEntry {
                name,
                size: size as u64,
                modified: Utc::now(),
            });
            (stream, Ok(entry))
        })
        .await
        .ok()
        .flatten()
    }

    async fn download(&self, remote: &str, local: &str) -> bool {
        let remote = remote.to_string();
        let local = local.to_string();
        self.with_stream(|mut stream| async move {
            let result = stream.retr_as_buffer(&remote).await;
            let outcome = match result {
                Ok(mut cursor) => {
                    let mut buf = Vec::new();
                    let ok = cursor.read_to_end(&mut buf).await.is_ok() && std::fs::write(&local, buf).is_ok();
                    Ok(ok)
                }
                Err(_) => Ok(false),
            };
            (stream, outcome)
        })
        .await
        .unwrap_or(false)
    }

    async fn upload(&self, local: &str, remote: &str) -> bool {
        let Ok(bytes) = std::fs::read(local) else {
            return false;
        };
        let remote = remote.to_string();
        self.with_stream(|mut stream| async move {
            let mut cursor = Cursor::new(bytes);
            let ok = stream.put_file(&remote, &mut cursor).await.is_ok();
            (stream, Ok(ok))
        })
        .await
        .unwrap_or(false)
    }

    async fn delete_file(&self, path: &str) -> bool {
        let path = path.to_string();
        self.with_stream(|mut stream| async move {
            let ok = stream.rm(&path).await.is_ok();
            (stream, Ok(ok))
        })
        .await
        .unwrap_or(false)
    }

    async fn mkdir(&self, path: &str) -> bool {
        let path = path.to_string();
        self.with_stream(|mut stream| async move {
            let ok = stream.mkdir(&path).await.is_ok();
            (stream, Ok(ok))
        })
        .await
        .unwrap_or(false)
    }

    async fn rmdir(&self, path: &str) -> bool {
        let path = path.to_string();
        self.with_stream(|mut stream| async move {
            let ok = stream.rmdir(&path).await.is_ok();
            (stream, Ok(ok))
        })
        .await
        .unwrap_or(false)
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
        let bytes = self
            .with_stream(|mut stream| async move {
                let outcome = match stream.retr_as_buffer(&remote).await {
                    Ok(mut cursor) => {
                        let mut buf = Vec::new();
                        cursor.read_to_end(&mut buf).await.map_err(PipelineError::from)?;
                        Ok(buf)
                    }
                    Err(e) => Err(PipelineError::io_error(format!("ftp retrieve failed: {e}"))),
                };
                (stream, outcome)
            })
            .await?;
        crate::application::utilities::hash::hash_bytes(&bytes, algo)
    }

    async fn close(&self) {
        if let Some(mut stream) = self.stream.lock().unwrap().take() {
            let _ = stream.quit().await;
        }
    }
}
