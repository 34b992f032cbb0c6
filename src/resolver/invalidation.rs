//! Keeps the transform cache coherent with graph changes.
//!
//! | Notification | Effect |
//! |---|---|
//! | node upserted | none |
//! | edge upserted / deleted, not RT | none |
//! | edge upserted / deleted, RT | evict dependents of both endpoints |
//! | node deleted | evict dependents of the node |
//!
//! Eviction is deliberately coarse: every cached path that ever crossed
//! the node goes, whether or not the change actually affects it.

use crate::graph::{GraphAccessor, GraphEvent, GraphListener};
use crate::model::{NodeId, RT_EDGE_TYPE};

use super::TransformResolver;

impl<G: GraphAccessor> GraphListener for TransformResolver<G> {
    fn on_edge_upserted(&self, from: NodeId, to: NodeId, edge_type: &str) {
        if edge_type == RT_EDGE_TYPE {
            self.invalidate_nodes(&[from, to]);
        }
    }

    fn on_node_deleted(&self, id: NodeId) {
        self.invalidate_node(id);
    }

    fn on_edge_deleted(&self, from: NodeId, to: NodeId, edge_type: &str) {
        if edge_type == RT_EDGE_TYPE {
            self.invalidate_nodes(&[from, to]);
        }
    }
}

impl<G: GraphAccessor> TransformResolver<G> {
    /// Apply one change notification.
    pub fn apply_event(&self, event: &GraphEvent) {
        event.dispatch(self);
    }
}

#[cfg(feature = "async")]
pub mod channel {
    //! Channel-driven invalidation for resolvers living on a tokio runtime.

    use std::sync::Arc;

    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError};
    use tokio::task::JoinHandle;

    use crate::graph::{GraphAccessor, GraphEvent, GraphListener};
    use crate::model::NodeId;
    use crate::resolver::TransformResolver;

    /// Forwards every notification into a channel, preserving order.
    ///
    /// Subscribe it to a graph and hand the receiver to
    /// [`spawn_invalidation`] or [`TransformResolver::drain_events`].
    pub struct ChannelListener {
        tx: UnboundedSender<GraphEvent>,
    }

    impl ChannelListener {
        pub fn new(tx: UnboundedSender<GraphEvent>) -> Self {
            Self { tx }
        }

        fn send(&self, event: GraphEvent) {
            if self.tx.send(event).is_err() {
                tracing::trace!("invalidation channel closed, dropping event");
            }
        }
    }

    impl GraphListener for ChannelListener {
        fn on_node_upserted(&self, id: NodeId, node_type: &str) {
            self.send(GraphEvent::NodeUpserted { id, node_type: node_type.to_string() });
        }

        fn on_edge_upserted(&self, from: NodeId, to: NodeId, edge_type: &str) {
            self.send(GraphEvent::EdgeUpserted { from, to, edge_type: edge_type.to_string() });
        }

        fn on_node_deleted(&self, id: NodeId) {
            self.send(GraphEvent::NodeDeleted { id });
        }

        fn on_edge_deleted(&self, from: NodeId, to: NodeId, edge_type: &str) {
            self.send(GraphEvent::EdgeDeleted { from, to, edge_type: edge_type.to_string() });
        }
    }

    /// Apply events from `rx` to `resolver` until every sender is gone.
    pub fn spawn_invalidation<G: GraphAccessor>(
        resolver: Arc<TransformResolver<G>>,
        mut rx: UnboundedReceiver<GraphEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                resolver.apply_event(&event);
            }
            tracing::debug!("invalidation channel closed");
        })
    }

    impl<G: GraphAccessor> TransformResolver<G> {
        /// Apply every event already queued in `rx` without waiting.
        ///
        /// Returns the number of events applied.
        pub fn drain_events(&self, rx: &mut UnboundedReceiver<GraphEvent>) -> usize {
            let mut applied = 0;
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        self.apply_event(&event);
                        applied += 1;
                    }
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
                }
            }
        }
    }
}
