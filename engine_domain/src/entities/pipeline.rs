use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::PipelineError;
use crate::value_objects::{NodeId, NodeType};

use super::pipeline_node::PipelineNode;

/// A directed edge: precedence and data-flow only, no payload of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

/// An immutable pipeline description: a node map plus an ordered edge list.
///
/// Constructed once per run (or once per load, for a long-lived executor)
/// from the JSON format in §6, handed around as a read-only snapshot for
/// the duration of that run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Insertion-ordered node map. Insertion order is the tie-break used by
    /// the topological sort in [`Pipeline::execution_order`].
    nodes: Vec<(NodeId, PipelineNode)>,
    edges: Vec<Edge>,
}

impl Pipeline {
    pub fn new(nodes: Vec<PipelineNode>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges,
        }
    }

    /// Parses the wire format described in §6:
    /// `{"nodes": [{"id","type","data":{"label",...},"position":...}], "edges": [{"source","target"}]}`.
    ///
    /// `position` is opaque UI-only data and is discarded here. Additional
    /// keys on a node, and unrecognized keys within `data`, are preserved in
    /// the node's config map (so a handler that doesn't care about them is
    /// free to ignore them) rather than rejected.
    pub fn parse(json: &str) -> Result<Self, PipelineError> {
        let doc: Json = serde_json::from_str(json)
            .map_err(|e| PipelineError::invalid_config(format!("malformed pipeline JSON: {e}")))?;

        let nodes_json = doc
            .get("nodes")
            .and_then(Json::as_array)
            .ok_or_else(|| PipelineError::invalid_config("pipeline JSON missing \"nodes\" array"))?;

        let mut nodes = Vec::with_capacity(nodes_json.len());
        for node_json in nodes_json {
            let id_str = node_json
                .get("id")
                .and_then(Json::as_str)
                .ok_or_else(|| PipelineError::invalid_config("node missing \"id\""))?;
            let id = NodeId::new(id_str)?;

            let type_str = node_json
                .get("type")
                .and_then(Json::as_str)
                .ok_or_else(|| PipelineError::invalid_config(format!("node {id} missing \"type\"")))?;
            let node_type: NodeType = type_str
                .parse()
                .map_err(|_| PipelineError::unknown_node_type(format!("node {id} has unknown type {type_str:?}")))?;

            let data = node_json.get("data").cloned().unwrap_or(Json::Object(Default::default()));
            let mut config: BTreeMap<String, Json> = data
                .as_object()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            let label = config.remove("label").and_then(|v| v.as_str().map(|s| s.to_string()));

            nodes.push(PipelineNode::new(id, node_type, label, config));
        }

        let edges_json = doc
            .get("edges")
            .and_then(Json::as_array)
            .ok_or_else(|| PipelineError::invalid_config("pipeline JSON missing \"edges\" array"))?;

        let mut edges = Vec::with_capacity(edges_json.len());
        for edge_json in edges_json {
            let source = edge_json
                .get("source")
                .and_then(Json::as_str)
                .ok_or_else(|| PipelineError::invalid_config("edge missing \"source\""))?;
            let target = edge_json
                .get("target")
                .and_then(Json::as_str)
                .ok_or_else(|| PipelineError::invalid_config("edge missing \"target\""))?;
            edges.push(Edge {
                source: NodeId::new(source)?,
                target: NodeId::new(target)?,
            });
        }

        Ok(Self::new(nodes, edges))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PipelineNode> {
        self.nodes.iter().map(|(_, n)| n)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn get(&self, id: &NodeId) -> Option<&PipelineNode> {
        self.nodes.iter().find(|(nid, _)| nid == id).map(|(_, n)| n)
    }

    /// Incoming edges targeting `id`, in edge-list order.
    pub fn incoming_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// All five fatal validation rules from §4.7, run together so a single
    /// malformed pipeline is rejected with every violation it has, not just
    /// the first one found.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut problems = Vec::new();

        if self.nodes.is_empty() {
            problems.push("pipeline has no nodes".to_string());
        }

        let start_count = self.nodes().filter(|n| n.node_type == NodeType::Start).count();
        if start_count != 1 {
            problems.push(format!("pipeline must have exactly one start node, found {start_count}"));
        }
        let end_count = self.nodes().filter(|n| n.node_type == NodeType::End).count();
        if end_count < 1 {
            problems.push("pipeline must have at least one end node".to_string());
        }

        let known_ids: HashSet<&NodeId> = self.nodes.iter().map(|(id, _)| id).collect();
        for edge in &self.edges {
            if !known_ids.contains(&edge.source) {
                problems.push(format!("edge references unknown source node {}", edge.source));
            }
            if !known_ids.contains(&edge.target) {
                problems.push(format!("edge references unknown target node {}", edge.target));
            }
        }

        if let Err(e) = self.detect_cycle() {
            problems.push(e);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::invalid_config(problems.join("; ")))
        }
    }

    /// Kahn's algorithm cycle check, per §4.7: seed a queue with
    /// in-degree-zero nodes, repeatedly pop and decrement; if fewer nodes
    /// are emitted than exist, a cycle exists.
    fn detect_cycle(&self) -> Result<(), String> {
        let emitted = self.kahn_emit().len();
        if emitted != self.nodes.len() {
            Err(format!(
                "circular dependency detected: only {emitted} of {} nodes could be ordered",
                self.nodes.len()
            ))
        } else {
            Ok(())
        }
    }

    /// Runs Kahn's algorithm once and returns the emission order. Ties
    /// (multiple in-degree-zero nodes available at once) are broken by node
    /// map insertion order, matching §4.7's tie-break rule.
    fn kahn_emit(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<&NodeId, usize> = self.nodes.iter().map(|(id, _)| (id, 0)).collect();
        for edge in &self.edges {
            if let Some(d) = in_degree.get_mut(&edge.target) {
                *d += 1;
            }
        }

        // VecDeque seeded in node-map insertion order so ties break that way.
        let mut queue: VecDeque<&NodeId> = self
            .nodes
            .iter()
            .map(|(id, _)| id)
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = queue.pop_front() {
            order.push(id.clone());
            for edge in self.edges.iter().filter(|e| &e.source == id) {
                if let Some(d) = in_degree.get_mut(&edge.target) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }
        order
    }

    /// The topological order the executor runs nodes in. Callers are
    /// expected to have called [`Pipeline::validate`] first; this does not
    /// re-check for cycles.
    pub fn execution_order(&self) -> Vec<NodeId> {
        self.kahn_emit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, ty: NodeType) -> PipelineNode {
        PipelineNode::new(NodeId::new(id).unwrap(), ty, None, BTreeMap::new())
    }

    fn edge(src: &str, dst: &str) -> Edge {
        Edge {
            source: NodeId::new(src).unwrap(),
            target: NodeId::new(dst).unwrap(),
        }
    }

    #[test]
    fn linear_pipeline_validates_and_orders() {
        let p = Pipeline::new(
            vec![node("start", NodeType::Start), node("f", NodeType::Filter), node("end", NodeType::End)],
            vec![edge("start", "f"), edge("f", "end")],
        );
        assert!(p.validate().is_ok());
        let order: Vec<String> = p.execution_order().into_iter().map(String::from).collect();
        assert_eq!(order, vec!["start", "f", "end"]);
    }

    #[test]
    fn cycle_is_rejected() {
        let p = Pipeline::new(
            vec![
                node("start", NodeType::Start),
                node("x", NodeType::Filter),
                node("y", NodeType::Filter),
                node("end", NodeType::End),
            ],
            vec![edge("start", "x"), edge("x", "y"), edge("y", "x"), edge("y", "end")],
        );
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("circular"));
    }

    #[test]
    fn missing_start_is_rejected() {
        let p = Pipeline::new(vec![node("end", NodeType::End)], vec![]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let p = Pipeline::new(
            vec![node("start", NodeType::Start), node("end", NodeType::End)],
            vec![edge("start", "ghost"), edge("ghost", "end")],
        );
        assert!(p.validate().is_err());
    }

    #[test]
    fn parses_wire_format() {
        let json = r#"{
            "nodes": [
                {"id": "start", "type": "start", "data": {"label": "Start"}, "position": {"x":0,"y":0}},
                {"id": "f", "type": "filter", "data": {"label": "F", "field": "amount"}},
                {"id": "end", "type": "end", "data": {}}
            ],
            "edges": [
                {"source": "start", "target": "f"},
                {"source": "f", "target": "end"}
            ]
        }"#;
        let p = Pipeline::parse(json).unwrap();
        assert!(p.validate().is_ok());
        let f = p.get(&NodeId::new("f").unwrap()).unwrap();
        assert_eq!(f.label.as_deref(), Some("F"));
        assert_eq!(f.config_str("field"), Some("amount"));
    }
}
