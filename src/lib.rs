//! # rt-graph: Transform Resolution over a Shared Scene Graph
//!
//! Frames (robots, sensors, objects) are nodes of a scene graph. `RT` edges
//! link a parent frame to a child frame and carry the rigid transform that
//! maps child-frame points into the parent frame. This crate answers
//! "what maps points in frame `orig` into frame `dest`?" and keeps the
//! answers cached until the graph changes underneath them.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphAccessor` is the contract between the resolver and the graph engine
//! 2. **Plain DTOs**: `Node`, `Edge`, `Value` cross all boundaries
//! 3. **Directional cache**: `(dest, orig)` keys, invalidated through a node → keys reverse index
//! 4. **Notifications drive eviction**: the resolver never polls the graph
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use glam::DVec3;
//! use rt_graph::{MemoryGraph, TransformResolver};
//!
//! # fn main() -> rt_graph::Result<()> {
//! let graph = Arc::new(MemoryGraph::new());
//! let world = graph.insert_root("world", "world")?;
//! let camera = graph.insert_node("camera", "rgbd")?;
//! graph.insert_or_assign_rt_edge(world, camera, DVec3::new(0.0, 0.0, 1.5), DVec3::ZERO)?;
//!
//! let resolver = TransformResolver::new(graph.clone());
//!
//! // A point one metre in front of the camera, seen from the world frame.
//! let p = resolver.transform_point("world", DVec3::new(0.0, 1.0, 0.0), "camera")?;
//! assert_eq!(p, DVec3::new(0.0, 1.0, 1.5));
//!
//! // Moving the camera invalidates the cached answer.
//! graph.insert_or_assign_rt_edge(world, camera, DVec3::new(0.0, 0.0, 2.0), DVec3::ZERO)?;
//! assert!(!resolver.is_cached("world", "camera"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Graph Accessors
//!
//! | Accessor | Feature | Description |
//! |----------|---------|-------------|
//! | `MemoryGraph` | (default) | In-memory graph for testing/embedding |
//! | `ChannelListener` | `async` | Feed notifications to a resolver through a tokio channel |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod math;
pub mod graph;
pub mod resolver;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, NodeId, Edge, EdgeKey, Value, AttributeMap,
    RT_EDGE_TYPE, RT_TRANSLATION, RT_ROTATION_EULER_XYZ,
};

// ============================================================================
// Re-exports: Graph
// ============================================================================

pub use graph::{GraphAccessor, GraphListener, GraphEvent, MemoryGraph};

// ============================================================================
// Re-exports: Resolver
// ============================================================================

pub use math::Pose;
pub use resolver::{TransformResolver, ResolverConfig, CacheKey, CacheStats};
#[cfg(feature = "async")]
pub use resolver::{ChannelListener, spawn_invalidation};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown frame, or a frame without depth information.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No common ancestor between '{dest}' and '{orig}'")]
    NoCommonAncestor { dest: String, orig: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A frame names a parent but no usable RT edge links them.
    #[error("Broken RT chain: no usable RT edge {parent} -> {child}")]
    BrokenChain { parent: NodeId, child: NodeId },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
