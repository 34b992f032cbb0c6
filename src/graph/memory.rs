//! In-memory scene graph.
//!
//! This is the reference implementation of `GraphAccessor`.
//! It keeps frames and edges in HashMaps behind a single RwLock and
//! maintains each frame's `parent` and `level` from its RT edges.
//!
//! ## Guarantees
//!
//! - **Ordered notifications**: mutations are serialized by a writer lock
//!   that is held until every listener has seen the mutation's events, so
//!   listeners observe changes in the order they were applied.
//! - **Visible before notified**: the state lock is released before any
//!   listener is called. A listener may read the graph from its callback.
//! - **Single RT parent**: an RT edge into a frame that already has a
//!   different parent re-parents it. RT edges that would close a cycle are
//!   rejected.
//!
//! ## Limitations
//!
//! - Reads are not snapshot-isolated: a resolution performing several
//!   lookups can observe a mutation half-way. The resolver tolerates this
//!   because the mutation's notification always follows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use glam::DVec3;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::model::*;
use crate::{Error, Result};
use super::{GraphAccessor, GraphEvent, GraphListener};

// ============================================================================
// MemoryGraph
// ============================================================================

/// In-memory scene graph. Cloning yields another handle to the same graph.
#[derive(Clone)]
pub struct MemoryGraph {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    state: RwLock<GraphState>,
    /// Serializes mutations together with the delivery of their events.
    writer: Mutex<()>,
    listeners: RwLock<Vec<Weak<dyn GraphListener>>>,
    next_node_id: AtomicU64,
}

#[derive(Default)]
struct GraphState {
    nodes: HashMap<NodeId, Node>,
    names: HashMap<String, NodeId>,
    edges: HashMap<EdgeKey, Edge>,
    /// node_id → keys of every edge touching the node
    adjacency: HashMap<NodeId, Vec<EdgeKey>>,
    /// node_id → RT children
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                state: RwLock::new(GraphState::default()),
                writer: Mutex::new(()),
                listeners: RwLock::new(Vec::new()),
                next_node_id: AtomicU64::new(1),
            }),
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert a tree root (level 0).
    pub fn insert_root(&self, name: &str, node_type: &str) -> Result<NodeId> {
        self.insert_node_at_level(name, node_type, Some(0))
    }

    /// Insert a frame that is not yet attached to any tree.
    pub fn insert_node(&self, name: &str, node_type: &str) -> Result<NodeId> {
        self.insert_node_at_level(name, node_type, None)
    }

    fn insert_node_at_level(&self, name: &str, node_type: &str, level: Option<u32>) -> Result<NodeId> {
        self.mutate(|state, events| {
            if state.names.contains_key(name) {
                return Err(Error::ConstraintViolation(format!("frame name '{name}' already in use")));
            }
            let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
            let mut node = Node::new(id, name, node_type);
            node.level = level;

            state.names.insert(name.to_string(), id);
            state.nodes.insert(id, node);
            state.adjacency.insert(id, Vec::new());

            tracing::debug!(%id, frame = name, node_type, "inserted node");
            events.push(GraphEvent::NodeUpserted { id, node_type: node_type.to_string() });
            Ok(id)
        })
    }

    /// Set an attribute on a node (upsert).
    pub fn set_node_attribute(&self, id: NodeId, key: &str, val: impl Into<Value>) -> Result<()> {
        let val = val.into();
        self.mutate(|state, events| {
            let node = state.nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
            node.attributes.insert(key.to_string(), val);
            events.push(GraphEvent::NodeUpserted { id, node_type: node.node_type.clone() });
            Ok(())
        })
    }

    /// Insert an edge, replacing any edge with the same `(from, to, type)`.
    ///
    /// RT edges also attach `to` under `from`, re-parenting it if needed.
    pub fn insert_or_assign_edge(&self, edge: Edge) -> Result<()> {
        self.mutate(|state, events| state.upsert_edge(edge, events))
    }

    /// Insert or update the RT edge `parent -> child`.
    pub fn insert_or_assign_rt_edge(
        &self,
        parent: NodeId,
        child: NodeId,
        translation: DVec3,
        rotation_euler_xyz: DVec3,
    ) -> Result<()> {
        self.insert_or_assign_edge(Edge::rt(parent, child, translation, rotation_euler_xyz))
    }

    /// Delete an edge. Returns true if it existed.
    ///
    /// Deleting an RT edge detaches the child's subtree.
    pub fn delete_edge(&self, from: NodeId, to: NodeId, edge_type: &str) -> Result<bool> {
        self.mutate(|state, events| Ok(state.remove_edge(&EdgeKey::new(from, to, edge_type), events)))
    }

    /// Delete a node and every edge touching it. Returns true if it existed.
    ///
    /// Each removed edge is notified before the node itself. RT children
    /// of the node are left detached.
    pub fn delete_node(&self, id: NodeId) -> Result<bool> {
        self.mutate(|state, events| {
            if !state.nodes.contains_key(&id) {
                return Ok(false);
            }
            let incident = state.adjacency.get(&id).cloned().unwrap_or_default();
            for key in &incident {
                state.remove_edge(key, events);
            }

            if let Some(node) = state.nodes.remove(&id) {
                state.names.remove(&node.name);
            }
            state.adjacency.remove(&id);
            state.children.remove(&id);

            tracing::debug!(%id, edges = incident.len(), "deleted node");
            events.push(GraphEvent::NodeDeleted { id });
            Ok(true)
        })
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn node_count(&self) -> usize {
        self.inner.state.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.state.read().edges.len()
    }

    /// Look up any edge by its endpoints and type.
    pub fn edge(&self, from: NodeId, to: NodeId, edge_type: &str) -> Option<Edge> {
        self.inner.state.read().edges.get(&EdgeKey::new(from, to, edge_type)).cloned()
    }

    /// RT children of a node.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.state.read().children.get(&id).cloned().unwrap_or_default()
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().iter().filter(|l| l.strong_count() > 0).count()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Apply a change under the state lock, then deliver its events.
    fn mutate<T>(&self, f: impl FnOnce(&mut GraphState, &mut Vec<GraphEvent>) -> Result<T>) -> Result<T> {
        let _writer = self.inner.writer.lock();
        let mut events = Vec::new();
        let result = {
            let mut state = self.inner.state.write();
            f(&mut state, &mut events)
        };
        self.notify(&events);
        result
    }

    fn notify(&self, events: &[GraphEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners: Vec<Arc<dyn GraphListener>> = {
            let mut listeners = self.inner.listeners.write();
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for event in events {
            for listener in &listeners {
                event.dispatch(listener.as_ref());
            }
        }
    }
}

impl GraphState {
    fn upsert_edge(&mut self, edge: Edge, events: &mut Vec<GraphEvent>) -> Result<()> {
        let (from, to) = (edge.from, edge.to);
        if !self.nodes.contains_key(&from) {
            return Err(Error::NotFound(format!("Source node {from}")));
        }
        if !self.nodes.contains_key(&to) {
            return Err(Error::NotFound(format!("Target node {to}")));
        }

        if edge.is_rt() {
            if self.is_ancestor_or_self(to, from) {
                return Err(Error::ConstraintViolation(format!(
                    "RT edge {from} -> {to} would create a cycle"
                )));
            }
            let previous_parent = self.nodes.get(&to).and_then(|n| n.parent);
            if let Some(old) = previous_parent.filter(|p| *p != from) {
                self.remove_edge(&EdgeKey::new(old, to, RT_EDGE_TYPE), events);
            }
            self.attach(from, to);
        }

        let key = edge.key();
        if self.edges.insert(key.clone(), edge).is_none() {
            self.adjacency.entry(from).or_default().push(key.clone());
            if from != to {
                self.adjacency.entry(to).or_default().push(key.clone());
            }
        }

        tracing::debug!(%from, %to, edge_type = %key.edge_type, "upserted edge");
        events.push(GraphEvent::EdgeUpserted { from, to, edge_type: key.edge_type });
        Ok(())
    }

    fn remove_edge(&mut self, key: &EdgeKey, events: &mut Vec<GraphEvent>) -> bool {
        let Some(edge) = self.edges.remove(key) else {
            return false;
        };
        for endpoint in [edge.from, edge.to] {
            if let Some(keys) = self.adjacency.get_mut(&endpoint) {
                keys.retain(|k| k != key);
            }
        }
        if edge.is_rt() {
            self.detach(edge.from, edge.to);
        }

        tracing::debug!(from = %edge.from, to = %edge.to, edge_type = %edge.edge_type, "deleted edge");
        events.push(GraphEvent::EdgeDeleted { from: edge.from, to: edge.to, edge_type: edge.edge_type });
        true
    }

    /// True if `ancestor` is `node` or lies on `node`'s parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        let parent_level = self.nodes.get(&parent).and_then(|n| n.level);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        let siblings = self.children.entry(parent).or_default();
        if !siblings.contains(&child) {
            siblings.push(child);
        }
        self.relevel(child, parent_level.map(|l| l + 1));
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|c| *c != child);
        }
        match self.nodes.get_mut(&child) {
            Some(node) if node.parent == Some(parent) => node.parent = None,
            _ => return,
        }
        self.relevel(child, None);
    }

    /// Set `level` on a subtree, counting down from `root`.
    fn relevel(&mut self, root: NodeId, level: Option<u32>) {
        let mut stack = vec![(root, level)];
        while let Some((id, level)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.level = level;
            }
            if let Some(children) = self.children.get(&id) {
                stack.extend(children.iter().map(|c| (*c, level.map(|l| l + 1))));
            }
        }
    }
}

// ============================================================================
// GraphAccessor impl
// ============================================================================

impl GraphAccessor for MemoryGraph {
    fn node_by_name(&self, name: &str) -> Option<Node> {
        let state = self.inner.state.read();
        state.names.get(name).and_then(|id| state.nodes.get(id)).cloned()
    }

    fn node(&self, id: NodeId) -> Option<Node> {
        self.inner.state.read().nodes.get(&id).cloned()
    }

    fn rt_edge(&self, parent: &Node, child: NodeId) -> Option<Edge> {
        self.inner.state.read().edges.get(&EdgeKey::new(parent.id, child, RT_EDGE_TYPE)).cloned()
    }

    fn subscribe(&self, listener: Weak<dyn GraphListener>) {
        self.inner.listeners.write().push(listener);
    }
}

// ============================================================================
// Tests
// ============================================================================
