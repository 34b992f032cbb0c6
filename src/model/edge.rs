//! Directed edge in the scene graph.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use super::{AttributeMap, NodeId, Value};

/// Edge kind carrying a rigid parent→child transform.
pub const RT_EDGE_TYPE: &str = "RT";

/// Attribute holding an RT edge's translation `[x, y, z]`.
pub const RT_TRANSLATION: &str = "rt_translation";

/// Attribute holding an RT edge's rotation as XYZ Euler angles in radians.
pub const RT_ROTATION_EULER_XYZ: &str = "rt_rotation_euler_xyz";

/// Identity of an edge: at most one edge of a given type links two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: NodeId,
    pub to: NodeId,
    pub edge_type: String,
}

impl EdgeKey {
    pub fn new(from: NodeId, to: NodeId, edge_type: impl Into<String>) -> Self {
        Self { from, to, edge_type: edge_type.into() }
    }
}

/// A directed edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub edge_type: String,
    pub attributes: AttributeMap,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, edge_type: impl Into<String>) -> Self {
        Self {
            from,
            to,
            edge_type: edge_type.into(),
            attributes: AttributeMap::new(),
        }
    }

    /// An RT edge whose transform maps `to`-frame points into the `from` frame.
    pub fn rt(from: NodeId, to: NodeId, translation: DVec3, rotation_euler_xyz: DVec3) -> Self {
        Self::new(from, to, RT_EDGE_TYPE)
            .with_attribute(RT_TRANSLATION, translation)
            .with_attribute(RT_ROTATION_EULER_XYZ, rotation_euler_xyz)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from, self.to, self.edge_type.clone())
    }

    pub fn is_rt(&self) -> bool {
        self.edge_type == RT_EDGE_TYPE
    }

    /// Decode the homogeneous transform stored on an RT edge.
    ///
    /// Returns `None` for non-RT edges or when either attribute is missing
    /// or not a 3-element float vector.
    pub fn rt_matrix(&self) -> Option<DMat4> {
        if !self.is_rt() {
            return None;
        }
        let translation = self.attributes.get(RT_TRANSLATION)?.as_dvec3()?;
        let rotation = self.attributes.get(RT_ROTATION_EULER_XYZ)?.as_dvec3()?;
        Some(crate::math::rt_matrix(translation, rotation))
    }
}
