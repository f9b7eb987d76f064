//! `ftp` send backend (§4.5): uploads the delivered file to a destination
//! FTP server, distinct from (and possibly a different host than) the
//! folder's own source FTP server.

use async_trait::async_trait;
use pipeline_flow_domain::entities::FolderConfiguration;
use pipeline_flow_domain::services::{SendBackend, SendResult};
use pipeline_flow_domain::PipelineError;
use suppaftp::AsyncNativeTlsFtpStream;

pub struct FtpBackend;

#[async_trait]
impl SendBackend for FtpBackend {
    fn name(&self) -> &'static str {
        "ftp"
    }

    async fn send(&self, folder: &FolderConfiguration, file_path: &str) -> SendResult {
        let Some(destination) = &folder.ftp_destination else {
            return SendResult::failed("ftp", "", "ftp_destination not configured");
        };

        let Ok(bytes) = std::fs::read(file_path) else {
            return SendResult::failed("ftp", &destination.host, format!("could not read {file_path}"));
        };
        let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
        let remote_path = format!("{}/{}", destination.folder.trim_end_matches('/'), file_name);

        let result: Result<(), String> = async {
            let mut stream = AsyncNativeTlsFtpStream::connect(format!("{}:{}", destination.host, destination.port))
                .await
                .map_err(|e| e.to_string())?;
            stream.login(&destination.username, &destination.password).await.map_err(|e| e.to_string())?;
            stream.mkdir(&destination.folder).await.ok();
            let mut cursor = std::io::Cursor::new(bytes);
            stream.put_file(&remote_path, &mut cursor).await.map_err(|e| e.to_string())?;
            stream.quit().await.ok();
            Ok(())
        }
        .await;

        match result {
            Ok(()) => SendResult::ok("ftp", format!("{}:{}", destination.host, remote_path)),
            Err(error) => SendResult::failed("ftp", format!("{}:{}", destination.host, remote_path), error),
        }
    }

    fn validate(&self, folder: &FolderConfiguration) -> Result<(), PipelineError> {
        match &folder.ftp_destination {
            Some(dest) if !dest.host.is_empty() && !dest.folder.is_empty() => Ok(()),
            _ => Err(PipelineError::missing_backend_field("ftp backend enabled without a complete ftp_destination")),
        }
    }
}
