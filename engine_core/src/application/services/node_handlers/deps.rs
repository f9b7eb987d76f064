use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pipeline_flow_domain::{services::RemoteFileSystem, PipelineError, Value};
use serde_json::Value as Json;

pub type RemoteFsFactory = Arc<dyn Fn(&str, &BTreeMap<String, Json>) -> Result<Box<dyn RemoteFileSystem>, PipelineError> + Send + Sync>;

/// In-memory, run-scoped table backing the `cache` node (§4.8). Owned by
/// `NodeDeps` rather than a static so it lives and dies with a single run,
/// matching "no static singletons" (§9).
pub type CacheTable = Arc<Mutex<BTreeMap<String, Value>>>;

/// External collaborators node handlers need beyond `(node, context)`:
/// a remote-filesystem factory for the I/O-bearing endpoints (§4.1), the
/// run's own `--input`/`--output` paths (used when a `folderSource`/`output`
/// node doesn't configure its own remote location), an HTTP client for
/// `apiEnrich`, and the `cache` node's keyed table. Constructed once per
/// pipeline run by the executor and threaded through by reference - no
/// static singletons, matching the "global/module-level state" design note
/// (§9).
#[derive(Clone)]
pub struct NodeDeps {
    pub remote_fs_factory: RemoteFsFactory,
    pub http_client: reqwest::Client,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub cache: CacheTable,
}

impl NodeDeps {
    pub fn new(remote_fs_factory: RemoteFsFactory) -> Self {
        Self {
            remote_fs_factory,
            http_client: reqwest::Client::new(),
            input_path: None,
            output_path: None,
            cache: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn with_paths(mut self, input_path: PathBuf, output_path: PathBuf) -> Self {
        self.input_path = Some(input_path);
        self.output_path = Some(output_path);
        self
    }
}
