//! Root-ward paths between two frames.
//!
//! Both frames climb toward the root until they meet. Depths are only used
//! to line the two climbs up before they advance in lock-step, which works
//! because every frame has at most one RT parent.

use std::collections::VecDeque;

use glam::DMat4;
use smallvec::SmallVec;

use crate::graph::GraphAccessor;
use crate::math;
use crate::model::{Node, NodeId};
use crate::{Error, Result};

/// One hop up the tree: the ancestor reached and the RT matrix of the edge
/// `ancestor -> previous node`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
    pub ancestor: NodeId,
    pub rt: DMat4,
}

/// The two halves of the path `orig -> common ancestor -> dest`.
#[derive(Debug, Clone, PartialEq)]
pub struct AncestorLists {
    pub orig: NodeId,
    pub dest: NodeId,
    /// Climb from `orig`, nearest ancestor first.
    pub up: SmallVec<[PathStep; 8]>,
    /// Climb from `dest`, stored top-down: the step closest to the root first.
    pub down: VecDeque<PathStep>,
}

impl AncestorLists {
    /// `T(dest <- orig)`: climb with each edge matrix, then descend with
    /// each inverse.
    pub fn compose(&self, singular_epsilon: f64) -> DMat4 {
        let mut acc = DMat4::IDENTITY;
        for step in &self.up {
            acc = step.rt * acc;
        }
        for step in &self.down {
            acc = math::invert(&step.rt, singular_epsilon) * acc;
        }
        acc
    }

    /// Every node the path touches, endpoints included. May repeat ids.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        [self.orig, self.dest]
            .into_iter()
            .chain(self.up.iter().map(|s| s.ancestor))
            .chain(self.down.iter().map(|s| s.ancestor))
    }
}

/// Build the two ancestor lists for `T(dest <- orig)`.
pub fn ancestor_lists<G: GraphAccessor + ?Sized>(graph: &G, dest: &str, orig: &str) -> Result<AncestorLists> {
    let orig_node = graph.node_by_name(orig).ok_or_else(|| Error::NotFound(format!("frame '{orig}'")))?;
    let dest_node = graph.node_by_name(dest).ok_or_else(|| Error::NotFound(format!("frame '{dest}'")))?;

    let orig_level = graph.level(&orig_node)
        .ok_or_else(|| Error::NotFound(format!("level of frame '{orig}'")))?;
    let dest_level = graph.level(&dest_node)
        .ok_or_else(|| Error::NotFound(format!("level of frame '{dest}'")))?;
    let min_level = orig_level.min(dest_level);

    let mut lists = AncestorLists {
        orig: orig_node.id,
        dest: dest_node.id,
        up: SmallVec::new(),
        down: VecDeque::new(),
    };

    let mut a = orig_node;
    while graph.level(&a).is_some_and(|l| l >= min_level) {
        let Some((parent, rt)) = climb(graph, &a)? else { break };
        lists.up.push(PathStep { ancestor: parent.id, rt });
        a = parent;
    }

    let mut b = dest_node;
    while graph.level(&b).is_some_and(|l| l >= min_level) {
        let Some((parent, rt)) = climb(graph, &b)? else { break };
        lists.down.push_front(PathStep { ancestor: parent.id, rt });
        b = parent;
    }

    while a.id != b.id {
        match (climb(graph, &a)?, climb(graph, &b)?) {
            (Some((p, rt_a)), Some((q, rt_b))) => {
                lists.up.push(PathStep { ancestor: p.id, rt: rt_a });
                lists.down.push_front(PathStep { ancestor: q.id, rt: rt_b });
                a = p;
                b = q;
            }
            _ => {
                return Err(Error::NoCommonAncestor {
                    dest: dest.to_string(),
                    orig: orig.to_string(),
                });
            }
        }
    }

    Ok(lists)
}

/// Step from `node` to its parent, reading the RT edge between them.
///
/// `Ok(None)` at a root.
fn climb<G: GraphAccessor + ?Sized>(graph: &G, node: &Node) -> Result<Option<(Node, DMat4)>> {
    let Some(parent) = graph.parent(node) else {
        return Ok(None);
    };
    let rt = graph.rt_edge(&parent, node.id).and_then(|edge| graph.rt_matrix(&edge));
    match rt {
        Some(rt) => Ok(Some((parent, rt))),
        None => {
            tracing::warn!(parent = %parent.name, child = %node.name, "parent without a usable RT edge");
            Err(Error::BrokenChain { parent: parent.id, child: node.id })
        }
    }
}
