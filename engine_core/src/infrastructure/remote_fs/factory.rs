//! Builds the [`RemoteFsFactory`] closure handed to `NodeDeps` and the
//! dispatch orchestrator: given a protocol name and its parameter map (as
//! produced from a node's config or a folder's `SourceConfig`, §4.1), picks
//! and constructs the matching [`RemoteFileSystem`] implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use pipeline_flow_domain::services::RemoteFileSystem;
use pipeline_flow_domain::PipelineError;
use serde_json::Value as Json;

use crate::application::services::node_handlers::deps::RemoteFsFactory;
use crate::infrastructure::remote_fs::{ftp::FtpFileSystem, local::LocalFileSystem, sftp::SftpFileSystem, smb::SmbFileSystem};

fn required_str<'a>(params: &'a BTreeMap<String, Json>, key: &str, protocol: &str) -> Result<&'a str, PipelineError> {
    params
        .get(key)
        .and_then(Json::as_str)
        .ok_or_else(|| PipelineError::invalid_config(format!("{protocol} filesystem requires a \"{key}\" parameter")))
}

fn optional_u16(params: &BTreeMap<String, Json>, key: &str, default: u16) -> u16 {
    params.get(key).and_then(Json::as_u64).map(|v| v as u16).unwrap_or(default)
}

fn optional_bool(params: &BTreeMap<String, Json>, key: &str, default: bool) -> bool {
    params.get(key).and_then(Json::as_bool).unwrap_or(default)
}

/// Returns the closure used everywhere a [`RemoteFsFactory`] is required.
/// `local` only needs `base_path`; `smb` needs `host`/`username`/`password`/
/// `share` (`port` defaults to 445); `sftp` needs `host`/`username` plus
/// either `password` or `private_key_path` (`port` defaults to 22, the key
/// takes precedence when both are present); `ftp` needs `host`/`username`/
/// `password` (`port` defaults to 21, `use_tls` defaults to `true`).
pub fn remote_fs_factory() -> RemoteFsFactory {
    Arc::new(|protocol: &str, params: &BTreeMap<String, Json>| -> Result<Box<dyn RemoteFileSystem>, PipelineError> {
        match protocol {
            "local" => {
                let base_path = required_str(params, "base_path", "local")?;
                Ok(Box::new(LocalFileSystem::new(base_path)))
            }
            "smb" => {
                let host = required_str(params, "host", "smb")?.to_string();
                let username = required_str(params, "username", "smb")?.to_string();
                let password = required_str(params, "password", "smb")?.to_string();
                let share = required_str(params, "share", "smb")?.to_string();
                let port = optional_u16(params, "port", 445);
                let fs = SmbFileSystem::new(host, share, username, password, port)?;
                Ok(Box::new(fs))
            }
            "sftp" => {
                let host = required_str(params, "host", "sftp")?.to_string();
                let username = required_str(params, "username", "sftp")?.to_string();
                let port = optional_u16(params, "port", 22);
                let private_key_path = params.get("private_key_path").and_then(Json::as_str).map(str::to_string);
                let password = params.get("password").and_then(Json::as_str).unwrap_or_default().to_string();
                if private_key_path.is_none() && password.is_empty() {
                    return Err(PipelineError::invalid_config("sftp filesystem requires either \"password\" or \"private_key_path\""));
                }
                Ok(Box::new(SftpFileSystem::new(host, port, username, password, private_key_path)))
            }
            "ftp" => {
                let host = required_str(params, "host", "ftp")?.to_string();
                let username = required_str(params, "username", "ftp")?.to_string();
                let password = required_str(params, "password", "ftp")?.to_string();
                let port = optional_u16(params, "port", 21);
                let use_tls = optional_bool(params, "use_tls", true);
                Ok(Box::new(FtpFileSystem::new(host, port, username, password, use_tls)))
            }
            other => Err(PipelineError::invalid_config(format!("unknown remote filesystem protocol \"{other}\""))),
        }
    })
}
