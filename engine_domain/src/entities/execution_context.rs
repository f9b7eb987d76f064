use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{NodeId, Value};

/// One entry of the structured error list a run accumulates (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    pub node_id: Option<NodeId>,
    pub message: String,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionError {
    pub fn new(node_id: Option<NodeId>, message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            node_id,
            message: message.into(),
            kind: kind.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-node timing and attempt bookkeeping, surfaced in pipeline-level
/// metrics at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub duration: Option<Duration>,
    pub attempts: u32,
}

/// The mutable state threaded through a single pipeline run.
///
/// Created once per run by the executor, passed by mutable reference into
/// each node handler, and discarded at run end - it owns nothing that
/// outlives the run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    node_outputs: HashMap<NodeId, Value>,
    errors: Vec<ExecutionError>,
    metrics: HashMap<NodeId, NodeMetrics>,
    cancelled: bool,
    /// The input carried into a node with no upstream edge. Empty at run
    /// start; §4.8 calls this the "current-data field".
    pub current_data: Value,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            current_data: Value::empty_records(),
            ..Default::default()
        }
    }

    pub fn publish(&mut self, node_id: NodeId, value: Value) {
        self.node_outputs.insert(node_id, value);
    }

    pub fn output_of(&self, node_id: &NodeId) -> Option<&Value> {
        self.node_outputs.get(node_id)
    }

    pub fn record_error(&mut self, error: ExecutionError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ExecutionError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn record_node_timing(&mut self, node_id: NodeId, duration: Duration) {
        self.metrics.entry(node_id).or_default().duration = Some(duration);
    }

    pub fn increment_attempts(&mut self, node_id: &NodeId) -> u32 {
        let entry = self.metrics.entry(node_id.clone()).or_default();
        entry.attempts += 1;
        entry.attempts
    }

    pub fn metrics_for(&self, node_id: &NodeId) -> Option<&NodeMetrics> {
        self.metrics.get(node_id)
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Total wall-clock time across every node that recorded a timing.
    pub fn total_duration(&self) -> Duration {
        self.metrics.values().filter_map(|m| m.duration).sum()
    }

    pub fn node_count(&self) -> usize {
        self.metrics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_no_errors_and_empty_current_data() {
        let ctx = ExecutionContext::new();
        assert!(!ctx.has_errors());
        assert!(ctx.current_data.is_empty());
    }

    #[test]
    fn publish_then_read_roundtrips() {
        let mut ctx = ExecutionContext::new();
        let id = NodeId::new("n1").unwrap();
        ctx.publish(id.clone(), Value::empty_records());
        assert!(ctx.output_of(&id).is_some());
    }

    #[test]
    fn attempts_increment_per_node() {
        let mut ctx = ExecutionContext::new();
        let id = NodeId::new("n1").unwrap();
        assert_eq!(ctx.increment_attempts(&id), 1);
        assert_eq!(ctx.increment_attempts(&id), 2);
    }
}
