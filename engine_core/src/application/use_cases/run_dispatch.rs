//! Dispatch orchestrator (C6, §4.6): folder -> file -> (validate, send),
//! with per-file error capture. Never propagates a per-file or per-folder
//! failure upward; everything lands in the result it returns.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pipeline_flow_domain::entities::SourceConfig;
use pipeline_flow_domain::repositories::ProcessedFileRepository;
use pipeline_flow_domain::services::EdiValidator;
use pipeline_flow_domain::{Checksum, FolderConfiguration, FolderId, ProcessedFileEntry};
use serde_json::{Map, Value as Json};

use crate::application::commands::RunDispatchCommand;
use crate::application::services::node_handlers::deps::RemoteFsFactory;
use crate::application::services::send_manager::SendManager;

/// A single file-level failure captured during a folder's processing.
#[derive(Debug, Clone)]
pub struct DispatchError {
    pub file_name: String,
    pub message: String,
}

/// Outcome of processing one folder configuration (§4.6).
#[derive(Debug, Clone, Default)]
pub struct FolderResult {
    pub folder_id: Option<FolderId>,
    pub alias: String,
    pub files_processed: usize,
    pub files_failed: usize,
    pub errors: Vec<DispatchError>,
    /// The source folder itself could not be resolved/listed - distinct
    /// from a file-level failure within an otherwise-reachable folder
    /// (§7's "folder unreachable" vs "some files failed" distinction).
    pub folder_unreachable: bool,
}

/// Accumulates [`FolderResult`]s across however many folders a caller feeds
/// it in one invocation (§4.6). Reset-able so a long-lived orchestrator can
/// be reused across scheduled runs without leaking memory.
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub folders_processed: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub folders_unreachable: usize,
    pub errors: Vec<DispatchError>,
}

impl DispatchSummary {
    pub fn add(&mut self, result: &FolderResult) {
        self.folders_processed += 1;
        self.files_processed += result.files_processed;
        self.files_failed += result.files_failed;
        if result.folder_unreachable {
            self.folders_unreachable += 1;
        }
        self.errors.extend(result.errors.iter().cloned());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// All folders fully resolved and every file within them succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.folders_unreachable == 0 && self.files_failed == 0
    }
}

fn protocol_name(source: &SourceConfig) -> &'static str {
    match source {
        SourceConfig::Local { .. } => "local",
        SourceConfig::Smb { .. } => "smb",
        SourceConfig::Sftp { .. } => "sftp",
        SourceConfig::Ftp { .. } => "ftp",
    }
}

fn source_params(source: &SourceConfig) -> BTreeMapJson {
    let json = serde_json::to_value(source).unwrap_or(Json::Object(Map::new()));
    match json {
        Json::Object(map) => map.into_iter().collect(),
        _ => Default::default(),
    }
}

type BTreeMapJson = std::collections::BTreeMap<String, Json>;

/// Runs the orchestrator over every folder in `folders`, sequentially, in
/// the order given (§4.6 "folders are processed in the order provided by
/// the caller"). Never throws: any folder- or file-level failure lands in
/// the returned summary.
pub async fn run_dispatch(
    _command: &RunDispatchCommand,
    folders: &[FolderConfiguration],
    remote_fs_factory: &RemoteFsFactory,
    ledger: &Arc<dyn ProcessedFileRepository>,
    send_manager: &SendManager,
    force_edi_validation: bool,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for folder in folders {
        let result = dispatch_folder(folder, remote_fs_factory, ledger, send_manager, force_edi_validation).await;
        summary.add(&result);
    }
    summary
}

async fn dispatch_folder(
    folder: &FolderConfiguration,
    remote_fs_factory: &RemoteFsFactory,
    ledger: &Arc<dyn ProcessedFileRepository>,
    send_manager: &SendManager,
    force_edi_validation: bool,
) -> FolderResult {
    let mut result = FolderResult {
        folder_id: Some(folder.folder_id),
        alias: folder.alias.clone(),
        ..Default::default()
    };

    let protocol = protocol_name(&folder.source);
    let params = source_params(&folder.source);
    let fs = match remote_fs_factory(protocol, &params) {
        Ok(fs) => fs,
        Err(error) => {
            result.folder_unreachable = true;
            result.errors.push(DispatchError {
                file_name: folder.path.clone(),
                message: format!("could not construct {protocol} filesystem: {error}"),
            });
            return result;
        }
    };

    if !fs.exists_dir(&folder.path).await {
        fs.close().await;
        result.folder_unreachable = true;
        result.errors.push(DispatchError {
            file_name: folder.path.clone(),
            message: format!("source directory {} does not exist", folder.path),
        });
        return result;
    }

    let entries = fs.list(&folder.path).await;
    if entries.is_empty() {
        fs.close().await;
        return result;
    }

    let ledger_entries = match ledger.find_by_folder(folder.folder_id).await {
        Ok(entries) => entries,
        Err(error) => {
            fs.close().await;
            result.folder_unreachable = true;
            result.errors.push(DispatchError {
                file_name: folder.path.clone(),
                message: format!("could not read processed-file ledger: {error}"),
            });
            return result;
        }
    };
    let name_map: HashMap<Checksum, String> = ledger_entries.iter().map(|e| (e.file_checksum.clone(), e.file_name.clone())).collect();
    let resend_set: HashSet<Checksum> = ledger_entries.iter().filter(|e| e.resend_flag).map(|e| e.file_checksum.clone()).collect();

    let force_edi_validation = force_edi_validation || folder.edi.force_edi_validation;
    let mut validator = EdiValidator::new();

    for entry in &entries {
        let remote_path = format!("{}/{}", folder.path.trim_end_matches('/'), entry.name);
        match process_file(folder, &fs, &remote_path, &name_map, &resend_set, &mut validator, force_edi_validation, send_manager, ledger).await {
            Ok(true) => result.files_processed += 1,
            Ok(false) => {}
            Err(message) => {
                result.files_failed += 1;
                result.errors.push(DispatchError {
                    file_name: remote_path,
                    message,
                });
            }
        }
    }

    fs.close().await;
    result
}

/// Processes a single listed file. Returns `Ok(true)` if it was sent and
/// recorded, `Ok(false)` if it was intentionally skipped (dedup or a
/// validation failure without `force_edi_validation`), `Err` on an
/// unexpected failure.
#[allow(clippy::too_many_arguments)]
async fn process_file(
    folder: &FolderConfiguration,
    fs: &dyn pipeline_flow_domain::services::RemoteFileSystem,
    remote_path: &str,
    name_map: &HashMap<Checksum, String>,
    resend_set: &HashSet<Checksum>,
    validator: &mut EdiValidator,
    force_edi_validation: bool,
    send_manager: &SendManager,
    ledger: &Arc<dyn ProcessedFileRepository>,
) -> Result<bool, String> {
    let checksum = fs.hash(remote_path, "md5").await.map_err(|e| e.to_string())?;
    let checksum = Checksum::new(checksum).map_err(|e| e.to_string())?;

    let (match_found, should_send) = crate::application::utilities::hash::decide_send(&checksum, name_map, resend_set);
    if match_found && !should_send {
        return Ok(false);
    }

    // Send backends operate on a local path (`copy` to a local directory,
    // `ftp`/`email` read the bytes to attach/transfer), so every source
    // protocol's file is staged locally once here rather than each backend
    // re-implementing its own download.
    let local_tmp = std::env::temp_dir().join(format!("dispatch-{}.tmp", checksum.as_str()));
    if !fs.download(remote_path, &local_tmp.to_string_lossy()).await {
        return Err(format!("could not download {remote_path} for processing"));
    }

    if folder.edi.process_edi {
        let contents = tokio::fs::read_to_string(&local_tmp).await.unwrap_or_default();
        let (is_valid, errors) = validator.validate(&contents);
        if !is_valid && !force_edi_validation {
            let _ = tokio::fs::remove_file(&local_tmp).await;
            return Err(format!("EDI validation failed: {}", errors.join("; ")));
        }
    }

    let outcome = send_manager.send(folder, &local_tmp.to_string_lossy()).await;
    let _ = tokio::fs::remove_file(&local_tmp).await;
    if outcome.all_succeeded() {
        let entry = ProcessedFileEntry::new(folder.folder_id, remote_path.to_string(), checksum, false);
        ledger.insert(entry).await.map_err(|e| e.to_string())?;
        Ok(true)
    } else {
        let failures: Vec<String> = outcome
            .results
            .iter()
            .filter(|r| !r.success)
            .map(|r| format!("{}: {}", r.backend_name, r.error_text.clone().unwrap_or_default()))
            .collect();
        Err(format!("send failed: {}", failures.join("; ")))
    }
}
