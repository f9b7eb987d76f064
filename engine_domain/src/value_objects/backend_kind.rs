use serde::{Deserialize, Serialize};

/// One of the three delivery backends a folder configuration can enable.
///
/// Named so that `process_backend_<name>` in the folder-configuration schema
/// (§6) maps directly onto a variant via [`BackendKind::config_key`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Copy,
    Ftp,
    Email,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Copy, BackendKind::Ftp, BackendKind::Email];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Copy => "copy",
            BackendKind::Ftp => "ftp",
            BackendKind::Email => "email",
        }
    }

    /// The folder-configuration toggle field name for this backend, e.g.
    /// `process_backend_copy`.
    pub fn config_key(&self) -> String {
        format!("process_backend_{}", self.name())
    }
}
