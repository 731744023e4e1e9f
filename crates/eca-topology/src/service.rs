//! Topology query collaborator

use crate::error::TopologyError;
use crate::graph::TopologySnapshot;
use eca_model::{EdgePointRef, SipId};
use parking_lot::RwLock;
use std::sync::Arc;

/// Read-only topology query service.
///
/// The decomposer and the orchestration actions consume this interface and
/// never mutate what it returns. How topology gets into the controller
/// (discovery, southbound sync, static files) is a collaborator concern.
#[async_trait::async_trait]
pub trait TopologyService: Send + Sync {
    /// Current topology snapshot
    async fn topology(&self) -> Result<Arc<TopologySnapshot>, TopologyError>;

    /// Resolve a service interface point to the system port exposing it
    async fn resolve_endpoint(&self, sip: &SipId) -> Result<EdgePointRef, TopologyError> {
        self.topology()
            .await?
            .resolve_sip(sip)
            .ok_or_else(|| TopologyError::EndpointNotFound(sip.clone()))
    }
}

/// In-process topology service over an atomically swappable snapshot.
///
/// Readers always see a complete snapshot: `replace` swaps the whole `Arc`
/// under a short write lock, so a request that started on the previous
/// snapshot keeps it alive until the request completes.
#[derive(Debug)]
pub struct SharedTopologyService {
    snapshot: RwLock<Arc<TopologySnapshot>>,
}

impl SharedTopologyService {
    /// Service serving `snapshot` until the next `replace`
    #[must_use]
    pub fn new(snapshot: TopologySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Swap in a new snapshot
    pub fn replace(&self, snapshot: TopologySnapshot) {
        tracing::debug!(
            nodes = snapshot.nodes().len(),
            links = snapshot.links().len(),
            "topology snapshot replaced"
        );
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// Current snapshot without going through the async trait
    #[must_use]
    pub fn current(&self) -> Arc<TopologySnapshot> {
        Arc::clone(&self.snapshot.read())
    }
}

impl Default for SharedTopologyService {
    fn default() -> Self {
        Self::new(TopologySnapshot::default())
    }
}

#[async_trait::async_trait]
impl TopologyService for SharedTopologyService {
    async fn topology(&self) -> Result<Arc<TopologySnapshot>, TopologyError> {
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgePoint, Node};

    fn one_node_snapshot(sip: &str) -> TopologySnapshot {
        TopologySnapshot::new(
            vec![Node::new("n1", vec![EdgePoint::new("n1:1").with_sip(sip)])],
            vec![],
        )
    }

    #[tokio::test]
    async fn resolve_endpoint_maps_sip_to_port() {
        let service = SharedTopologyService::new(one_node_snapshot("sip:a"));

        let resolved = service.resolve_endpoint(&SipId::new("sip:a")).await.unwrap();
        assert_eq!(resolved, EdgePointRef::new("n1", "n1:1"));
    }

    #[tokio::test]
    async fn resolve_endpoint_unknown_sip_fails() {
        let service = SharedTopologyService::new(one_node_snapshot("sip:a"));

        let err = service.resolve_endpoint(&SipId::new("sip:zz")).await.unwrap_err();
        assert!(matches!(err, TopologyError::EndpointNotFound(_)));
    }

    #[tokio::test]
    async fn replace_swaps_snapshot_for_new_readers() {
        let service = SharedTopologyService::new(one_node_snapshot("sip:a"));
        let before = service.current();

        service.replace(one_node_snapshot("sip:b"));

        // the old snapshot stays valid for in-flight readers
        assert!(before.resolve_sip(&SipId::new("sip:a")).is_some());
        let after = service.topology().await.unwrap();
        assert!(after.resolve_sip(&SipId::new("sip:b")).is_some());
        assert!(after.resolve_sip(&SipId::new("sip:a")).is_none());
    }
}
