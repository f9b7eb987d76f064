use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// A node identifier, unique within a single pipeline description.
///
/// Node ids are author-supplied strings from the pipeline JSON (`"n1"`,
/// `"filter-amount"`, ...), not generated. The only invariant the domain
/// enforces is that they are non-empty; uniqueness within a pipeline is a
/// property of the `Pipeline` entity as a whole, not of a single id.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Result<Self, PipelineError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PipelineError::invalid_config("node id must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the synthetic id a `router` node publishes its "true" channel
    /// under: `<id>_true`.
    pub fn true_channel(&self) -> NodeId {
        NodeId(format!("{}_true", self.0))
    }

    /// Builds the synthetic id a `router` node publishes its "false" channel
    /// under: `<id>_false`.
    pub fn false_channel(&self) -> NodeId {
        NodeId(format!("{}_false", self.0))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_id() {
        assert!(NodeId::new("").is_err());
    }

    #[test]
    fn synthetic_channel_ids() {
        let id = NodeId::new("router1").unwrap();
        assert_eq!(id.true_channel().as_str(), "router1_true");
        assert_eq!(id.false_channel().as_str(), "router1_false");
    }
}
