//! # Graph Accessor Trait
//!
//! This is the contract between the transform resolver and whatever engine
//! owns the scene graph. The resolver only ever reads through it and listens
//! to its change notifications.
//!
//! ## Implementations
//!
//! | Accessor | Module | Description |
//! |----------|--------|-------------|
//! | `MemoryGraph` | `memory` | In-memory for testing/embedding |

pub mod memory;

use std::sync::Weak;

use glam::DMat4;
use serde::{Deserialize, Serialize};

use crate::model::*;

pub use memory::MemoryGraph;

// ============================================================================
// Change notifications
// ============================================================================

/// Receives structural change notifications from a graph.
///
/// Every method defaults to a no-op so listeners only override what they
/// care about. Calls arrive in the order the changes became visible.
pub trait GraphListener: Send + Sync {
    /// A node was created or one of its attributes changed.
    fn on_node_upserted(&self, _id: NodeId, _node_type: &str) {}

    /// An edge was created or one of its attributes changed.
    fn on_edge_upserted(&self, _from: NodeId, _to: NodeId, _edge_type: &str) {}

    fn on_node_deleted(&self, _id: NodeId) {}

    fn on_edge_deleted(&self, _from: NodeId, _to: NodeId, _edge_type: &str) {}
}

/// A single change notification, as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEvent {
    NodeUpserted { id: NodeId, node_type: String },
    EdgeUpserted { from: NodeId, to: NodeId, edge_type: String },
    NodeDeleted { id: NodeId },
    EdgeDeleted { from: NodeId, to: NodeId, edge_type: String },
}

impl GraphEvent {
    /// Deliver this event to the matching listener callback.
    pub fn dispatch(&self, listener: &dyn GraphListener) {
        match self {
            GraphEvent::NodeUpserted { id, node_type } => listener.on_node_upserted(*id, node_type),
            GraphEvent::EdgeUpserted { from, to, edge_type } => listener.on_edge_upserted(*from, *to, edge_type),
            GraphEvent::NodeDeleted { id } => listener.on_node_deleted(*id),
            GraphEvent::EdgeDeleted { from, to, edge_type } => listener.on_edge_deleted(*from, *to, edge_type),
        }
    }
}

// ============================================================================
// GraphAccessor Trait
// ============================================================================

/// Read access to a scene graph plus its notification stream.
///
/// Implementations must be safe to query from several threads while being
/// mutated, and must deliver notifications only after the corresponding
/// change is visible through the read methods.
pub trait GraphAccessor: Send + Sync + 'static {
    // ========================================================================
    // Lookup
    // ========================================================================

    /// Find a node by its frame name.
    fn node_by_name(&self, name: &str) -> Option<Node>;

    /// Find a node by id.
    fn node(&self, id: NodeId) -> Option<Node>;

    // ========================================================================
    // Tree structure
    // ========================================================================

    /// Distance from the graph root. `None` for unattached nodes.
    fn level(&self, node: &Node) -> Option<u32> {
        node.level
    }

    /// The node's parent along RT edges.
    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent.and_then(|id| self.node(id))
    }

    /// The RT edge `parent -> child`, if any.
    fn rt_edge(&self, parent: &Node, child: NodeId) -> Option<Edge>;

    /// Decode the transform carried by an RT edge.
    fn rt_matrix(&self, edge: &Edge) -> Option<DMat4> {
        edge.rt_matrix()
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Register a listener. Dropped listeners are skipped and pruned.
    fn subscribe(&self, listener: Weak<dyn GraphListener>);
}
