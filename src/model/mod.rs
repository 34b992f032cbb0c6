//! # Scene Graph Model
//!
//! Plain data types describing frames and the edges between them.
//! These types cross every boundary: graph accessor ↔ resolver ↔ user.
//!
//! This module is pure data. Locking and notifications live in `graph`.

pub mod node;
pub mod edge;
pub mod value;
pub mod attribute_map;

pub use node::{Node, NodeId};
pub use edge::{Edge, EdgeKey, RT_EDGE_TYPE, RT_TRANSLATION, RT_ROTATION_EULER_XYZ};
pub use value::Value;
pub use attribute_map::AttributeMap;
