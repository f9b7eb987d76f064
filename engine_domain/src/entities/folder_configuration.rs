use serde::{Deserialize, Serialize};

use crate::value_objects::{BackendKind, FolderId};

/// Per-protocol connection parameters for a folder's source (§3, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum SourceConfig {
    Local {
        base_path: String,
    },
    Smb {
        host: String,
        username: String,
        password: String,
        share: String,
        #[serde(default = "SourceConfig::default_smb_port")]
        port: u16,
    },
    Sftp {
        host: String,
        username: String,
        password: String,
        #[serde(default = "SourceConfig::default_sftp_port")]
        port: u16,
        private_key_path: Option<String>,
    },
    Ftp {
        host: String,
        username: String,
        password: String,
        #[serde(default = "SourceConfig::default_ftp_port")]
        port: u16,
        #[serde(default = "SourceConfig::default_use_tls")]
        use_tls: bool,
    },
}

impl SourceConfig {
    fn default_smb_port() -> u16 {
        445
    }
    fn default_sftp_port() -> u16 {
        22
    }
    fn default_ftp_port() -> u16 {
        21
    }
    fn default_use_tls() -> bool {
        true
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            SourceConfig::Local { base_path } => Some(base_path),
            _ => None,
        }
    }
}

/// EDI processing toggles a folder can carry (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdiFlags {
    #[serde(default)]
    pub process_edi: bool,
    #[serde(default)]
    pub tweak_edi: bool,
    #[serde(default)]
    pub split_edi: bool,
    #[serde(default)]
    pub force_edi_validation: bool,
    #[serde(default)]
    pub convert_to_format: Option<String>,
}

/// A configured source folder, as handed to the dispatch orchestrator (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderConfiguration {
    pub folder_id: FolderId,
    pub alias: String,
    pub source: SourceConfig,
    pub path: String,

    pub process_backend_copy: bool,
    pub process_backend_ftp: bool,
    pub process_backend_email: bool,

    pub copy_to_directory: Option<String>,
    pub ftp_destination: Option<FtpDestination>,
    pub email_destination: Option<EmailDestination>,

    pub edi: EdiFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpDestination {
    pub host: String,
    pub port: u16,
    pub folder: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDestination {
    pub recipients: Vec<String>,
    pub subject: String,
}

impl FolderConfiguration {
    /// The subset of `BackendKind` this folder has enabled, per §4.5.
    pub fn enabled_backends(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|b| match b {
                BackendKind::Copy => self.process_backend_copy,
                BackendKind::Ftp => self.process_backend_ftp,
                BackendKind::Email => self.process_backend_email,
            })
            .collect()
    }
}
