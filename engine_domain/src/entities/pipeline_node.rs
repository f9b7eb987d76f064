use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value_objects::{NodeId, NodeType};

/// A single node of a pipeline description, as parsed from the pipeline JSON.
///
/// `config` keeps the raw `data` object (minus `label`, which is lifted out
/// for convenience) as an opaque string-keyed JSON mapping. Per-handler
/// typed config is parsed out of this map at execution time by the handler
/// that owns that node type - see `pipeline-flow`'s
/// `application::services::node_handlers`. Unrecognized keys within it are
/// simply never read by a given handler, exactly as §6 specifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: Option<String>,
    pub config: BTreeMap<String, Json>,
}

impl PipelineNode {
    pub fn new(id: NodeId, node_type: NodeType, label: Option<String>, config: BTreeMap<String, Json>) -> Self {
        Self {
            id,
            node_type,
            label,
            config,
        }
    }

    /// Reads a string config key.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Json::as_str)
    }

    /// Reads a boolean config key, defaulting to `false` when absent.
    pub fn config_bool(&self, key: &str) -> bool {
        self.config.get(key).and_then(Json::as_bool).unwrap_or(false)
    }

    /// Reads a numeric config key as `f64`.
    pub fn config_f64(&self, key: &str) -> Option<f64> {
        self.config.get(key).and_then(Json::as_f64)
    }
}
