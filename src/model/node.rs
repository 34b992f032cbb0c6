//! Frame node in the scene graph.

use serde::{Deserialize, Serialize};
use super::{AttributeMap, Value};

/// Opaque node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame (robot, sensor, object) in the scene graph.
///
/// `parent` and `level` are maintained by the graph from its RT edges;
/// both are `None` while the node is not attached to a rooted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Stable human-readable frame name, unique within a graph.
    pub name: String,
    pub node_type: String,
    pub attributes: AttributeMap,
    pub parent: Option<NodeId>,
    pub level: Option<u32>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            node_type: node_type.into(),
            attributes: AttributeMap::new(),
            parent: None,
            level: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
