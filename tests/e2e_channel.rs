//! Invalidation delivered through a tokio channel instead of direct callbacks.
#![cfg(feature = "async")]

use std::sync::Arc;

use glam::DVec3;
use pretty_assertions::assert_eq;
use rt_graph::{ChannelListener, GraphAccessor, GraphListener, MemoryGraph, ResolverConfig, TransformResolver, spawn_invalidation};
use tokio::sync::mpsc;

fn scene() -> (Arc<MemoryGraph>, rt_graph::NodeId, rt_graph::NodeId) {
    let graph = Arc::new(MemoryGraph::new());
    let world = graph.insert_root("world", "world").unwrap();
    let lidar = graph.insert_node("lidar", "sensor").unwrap();
    graph.insert_or_assign_rt_edge(world, lidar, DVec3::new(0.0, 0.0, 1.0), DVec3::ZERO).unwrap();
    (graph, world, lidar)
}

#[tokio::test]
async fn test_drain_events_applies_queued_invalidations() {
    let (graph, world, lidar) = scene();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn GraphListener> = Arc::new(ChannelListener::new(tx));
    graph.subscribe(Arc::downgrade(&listener));

    let resolver = TransformResolver::detached(graph.clone(), ResolverConfig::default());
    resolver.resolve("world", "lidar").unwrap();

    graph.set_node_attribute(lidar, "fps", 10i64).unwrap();
    graph.insert_or_assign_rt_edge(world, lidar, DVec3::new(0.0, 0.0, 2.0), DVec3::ZERO).unwrap();

    // Nothing is evicted until the queue is drained.
    assert!(resolver.is_cached("world", "lidar"));
    assert_eq!(resolver.drain_events(&mut rx), 2);
    assert!(!resolver.is_cached("world", "lidar"));
    assert_eq!(resolver.drain_events(&mut rx), 0);

    let p = resolver.transform_point_origin("world", "lidar").unwrap();
    assert_eq!(p, DVec3::new(0.0, 0.0, 2.0));
}

#[tokio::test]
async fn test_spawned_task_invalidates_until_channel_closes() {
    let (graph, world, lidar) = scene();
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn GraphListener> = Arc::new(ChannelListener::new(tx));
    graph.subscribe(Arc::downgrade(&listener));

    let resolver = Arc::new(TransformResolver::detached(graph.clone(), ResolverConfig::default()));
    let handle = spawn_invalidation(resolver.clone(), rx);

    resolver.resolve("world", "lidar").unwrap();
    graph.delete_edge(world, lidar, rt_graph::RT_EDGE_TYPE).unwrap();

    // Dropping the only sender ends the task once the queue is empty.
    drop(listener);
    handle.await.unwrap();

    assert!(!resolver.is_cached("world", "lidar"));
    assert_eq!(resolver.stats().evictions, 1);
}
