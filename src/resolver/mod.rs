//! # Transform Resolver
//!
//! Answers "which matrix maps points in frame `orig` into frame `dest`?" by
//! composing RT edges along the tree path between the two frames, and
//! memoizes every answer until a structural change touches its path.
//!
//! ## Cache coherence
//!
//! The cache and its reverse index (node id → keys whose path crossed that
//! node) sit behind one mutex. A miss holds it while resolving, composing
//! and inserting; eviction takes the same mutex. Because the graph notifies
//! only after a change is visible, anything a racing query inserted from
//! the old structure is evicted right after.
//!
//! ```rust
//! use std::sync::Arc;
//! use glam::DVec3;
//! use rt_graph::{MemoryGraph, TransformResolver};
//!
//! # fn main() -> rt_graph::Result<()> {
//! let graph = Arc::new(MemoryGraph::new());
//! let world = graph.insert_root("world", "world")?;
//! let robot = graph.insert_node("robot", "omnirobot")?;
//! graph.insert_or_assign_rt_edge(world, robot, DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO)?;
//!
//! let resolver = TransformResolver::new(graph.clone());
//! let p = resolver.transform_point_origin("world", "robot")?;
//! assert_eq!(p, DVec3::new(1.0, 0.0, 0.0));
//! # Ok(())
//! # }
//! ```

pub mod path;
mod invalidation;

#[cfg(feature = "async")]
pub use invalidation::channel::{ChannelListener, spawn_invalidation};

use std::sync::{Arc, Weak};

use glam::{DMat4, DVec3};
use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::graph::{GraphAccessor, GraphListener};
use crate::math::{self, Pose};
use crate::model::NodeId;
use crate::{Error, Result};

// ============================================================================
// Configuration
// ============================================================================

/// Resolver tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// When false every query recomputes from the graph.
    pub cache_enabled: bool,
    /// Edge matrices with `|det|` below this are treated as corrupt.
    pub singular_epsilon: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            singular_epsilon: 1e-12,
        }
    }
}

impl ResolverConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Directional cache key: `(dest, orig)` and `(orig, dest)` are unrelated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub dest: String,
    pub orig: String,
}

impl CacheKey {
    pub fn new(dest: impl Into<String>, orig: impl Into<String>) -> Self {
        Self { dest: dest.into(), orig: orig.into() }
    }
}

/// Counters for observing cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Cache entries actually removed by invalidation.
    pub evictions: u64,
}

#[derive(Default)]
struct TransformCache {
    transforms: HashMap<CacheKey, DMat4>,
    /// node id → keys whose resolution path crossed the node
    dependents: HashMap<NodeId, HashSet<CacheKey>>,
    stats: CacheStats,
}

impl TransformCache {
    fn insert(&mut self, key: CacheKey, matrix: DMat4, path: impl IntoIterator<Item = NodeId>) {
        for id in path {
            self.dependents.entry(id).or_default().insert(key.clone());
        }
        self.transforms.insert(key, matrix);
    }

    fn evict(&mut self, id: NodeId) -> usize {
        let Some(keys) = self.dependents.remove(&id) else {
            return 0;
        };
        let evicted = keys.iter().filter(|key| self.transforms.remove(*key).is_some()).count();
        self.stats.evictions += evicted as u64;
        evicted
    }
}

// ============================================================================
// TransformResolver
// ============================================================================

/// Resolves and caches transforms between frames of a shared graph.
pub struct TransformResolver<G: GraphAccessor> {
    graph: Arc<G>,
    config: ResolverConfig,
    cache: Mutex<TransformCache>,
}

impl<G: GraphAccessor> TransformResolver<G> {
    /// Create a resolver and subscribe it to the graph's notifications.
    pub fn new(graph: Arc<G>) -> Arc<Self> {
        Self::with_config(graph, ResolverConfig::default())
    }

    pub fn with_config(graph: Arc<G>, config: ResolverConfig) -> Arc<Self> {
        let resolver = Arc::new(Self::detached(graph, config));
        let listener: Weak<dyn GraphListener> = Arc::downgrade(&resolver) as Weak<dyn GraphListener>;
        resolver.graph.subscribe(listener);
        resolver
    }

    /// Create a resolver that is NOT subscribed to the graph.
    ///
    /// The caller is responsible for feeding it every structural change via
    /// [`Self::apply_event`] (or a channel), in order.
    pub fn detached(graph: Arc<G>, config: ResolverConfig) -> Self {
        Self {
            graph,
            config,
            cache: Mutex::new(TransformCache::default()),
        }
    }

    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The matrix `T(dest <- orig)` mapping points expressed in `orig` into `dest`.
    pub fn resolve(&self, dest: &str, orig: &str) -> Result<DMat4> {
        if !self.config.cache_enabled {
            return self.resolve_uncached(dest, orig);
        }

        let key = CacheKey::new(dest, orig);
        let mut cache = self.cache.lock();
        if let Some(matrix) = cache.transforms.get(&key).copied() {
            cache.stats.hits += 1;
            tracing::trace!(dest, orig, "transform cache hit");
            return Ok(matrix);
        }
        cache.stats.misses += 1;

        let lists = path::ancestor_lists(self.graph.as_ref(), dest, orig)?;
        let matrix = lists.compose(self.config.singular_epsilon);
        cache.insert(key, matrix, lists.node_ids());

        tracing::debug!(dest, orig, hops = lists.up.len() + lists.down.len(), "resolved transform");
        Ok(matrix)
    }

    /// Like [`Self::resolve`] but never reads or writes the cache.
    pub fn resolve_uncached(&self, dest: &str, orig: &str) -> Result<DMat4> {
        let lists = path::ancestor_lists(self.graph.as_ref(), dest, orig)?;
        Ok(lists.compose(self.config.singular_epsilon))
    }

    /// Re-express a point given in `orig` in `dest`.
    pub fn transform_point(&self, dest: &str, point: DVec3, orig: &str) -> Result<DVec3> {
        let m = self.resolve(dest, orig)?;
        Ok(math::transform_point(&m, point))
    }

    /// Where `orig`'s origin lies in `dest`.
    pub fn transform_point_origin(&self, dest: &str, orig: &str) -> Result<DVec3> {
        self.transform_point(dest, DVec3::ZERO, orig)
    }

    /// Re-express a 6-element pose `[x, y, z, rx, ry, rz]` given in `orig` in `dest`.
    pub fn transform_pose(&self, dest: &str, pose: &[f64], orig: &str) -> Result<Pose> {
        let pose = Pose::try_from(pose)?;
        let m = self.resolve(dest, orig)?;
        Ok(pose.transformed_by(&m))
    }

    /// Position and orientation of `orig`'s origin in `dest`.
    pub fn transform_pose_origin(&self, dest: &str, orig: &str) -> Result<Pose> {
        self.transform_pose(dest, &Pose::ORIGIN.to_array(), orig)
    }

    /// Transform a 3-vector (point) or 6-vector (pose); other lengths are rejected.
    pub fn transform(&self, dest: &str, v: &[f64], orig: &str) -> Result<Vec<f64>> {
        match v {
            [x, y, z] => {
                let p = self.transform_point(dest, DVec3::new(*x, *y, *z), orig)?;
                Ok(p.to_array().to_vec())
            }
            [_, _, _, _, _, _] => Ok(self.transform_pose(dest, v, orig)?.to_array().to_vec()),
            _ => Err(Error::InvalidArgument(format!(
                "expected a 3- or 6-element vector, got {} elements", v.len()
            ))),
        }
    }

    // ========================================================================
    // Cache management
    // ========================================================================

    /// Drop every cached transform whose path crossed `id`.
    ///
    /// Returns the number of cache entries removed. Unknown ids are a no-op.
    pub fn invalidate_node(&self, id: NodeId) -> usize {
        self.invalidate_nodes(&[id])
    }

    pub fn invalidate_nodes(&self, ids: &[NodeId]) -> usize {
        let mut cache = self.cache.lock();
        let evicted: usize = ids.iter().map(|id| cache.evict(*id)).sum();
        if evicted > 0 {
            tracing::debug!(?ids, evicted, "invalidated cached transforms");
        }
        evicted
    }

    /// Forget everything.
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.transforms.clear();
        cache.dependents.clear();
    }

    pub fn is_cached(&self, dest: &str, orig: &str) -> bool {
        self.cache.lock().transforms.contains_key(&CacheKey::new(dest, orig))
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().transforms.len()
    }

    /// Cache keys recorded against a node in the reverse index.
    pub fn dependents_of(&self, id: NodeId) -> Vec<CacheKey> {
        self.cache.lock().dependents.get(&id).map(|keys| keys.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.lock().stats
    }
}

// ============================================================================
// Tests
// ============================================================================
