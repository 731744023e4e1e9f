//! Service and connection persistence
//!
//! The controller persists one service record per request plus its
//! connection records: one per traversed node and one aggregate carrying
//! the end-to-end route. Storage format and durability are the
//! collaborator's concern; the in-memory implementation here backs tests
//! and single-process deployments.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use eca_model::{ConnectionId, EdgePointRef, EndPoint, NodeId, ServiceId};
use serde::{Deserialize, Serialize};

/// A realized connection, either per-node or the end-to-end aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Record key
    pub id: ConnectionId,
    /// Owning service
    pub service: ServiceId,
    /// Node the connection is configured on; `None` for the aggregate
    pub node: Option<NodeId>,
    /// Ports the connection interconnects
    pub endpoints: Vec<EdgePointRef>,
    /// For the aggregate: the per-node connections realizing the route
    pub route: Vec<ConnectionId>,
}

impl ConnectionRecord {
    /// Per-node connection configured on `node`
    #[must_use]
    pub fn for_node(service: &ServiceId, node: NodeId, endpoints: Vec<EdgePointRef>) -> Self {
        Self {
            id: ConnectionId::for_node(&node, service),
            service: service.clone(),
            node: Some(node),
            endpoints,
            route: Vec::new(),
        }
    }

    /// End-to-end aggregate over the given per-node connections
    #[must_use]
    pub fn aggregate(
        service: &ServiceId,
        endpoints: Vec<EdgePointRef>,
        route: Vec<ConnectionId>,
    ) -> Self {
        Self {
            id: ConnectionId::aggregate(service),
            service: service.clone(),
            node: None,
            endpoints,
            route,
        }
    }
}

/// A persisted connectivity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Record key
    pub id: ServiceId,
    /// The requested endpoints, resolved to system ports
    pub endpoints: Vec<EndPoint>,
    /// The aggregate connection realizing the service
    pub aggregate_connection: ConnectionId,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Persistence errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend failed to read or write
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence collaborator keyed by opaque service and connection ids
#[async_trait::async_trait]
pub trait ServiceStore: Send + Sync {
    /// Persist a service together with all its connections
    async fn insert_service(
        &self,
        service: ServiceRecord,
        connections: Vec<ConnectionRecord>,
    ) -> Result<(), StoreError>;

    /// Load a service record
    async fn service(&self, id: &ServiceId) -> Result<Option<ServiceRecord>, StoreError>;

    /// All service records
    async fn services(&self) -> Result<Vec<ServiceRecord>, StoreError>;

    /// Load a connection record
    async fn connection(&self, id: &ConnectionId) -> Result<Option<ConnectionRecord>, StoreError>;

    /// All connections belonging to a service
    async fn connections_of(&self, id: &ServiceId) -> Result<Vec<ConnectionRecord>, StoreError>;

    /// Replace the stored endpoint matching `endpoint`'s sip
    async fn update_service_endpoint(
        &self,
        id: &ServiceId,
        endpoint: EndPoint,
    ) -> Result<(), StoreError>;

    /// Remove a service and every connection belonging to it
    async fn remove_service(&self, id: &ServiceId) -> Result<(), StoreError>;
}

/// In-memory store over concurrent maps
#[derive(Debug, Default)]
pub struct InMemoryServiceStore {
    services: DashMap<ServiceId, ServiceRecord>,
    connections: DashMap<ConnectionId, ConnectionRecord>,
}

impl InMemoryServiceStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ServiceStore for InMemoryServiceStore {
    async fn insert_service(
        &self,
        service: ServiceRecord,
        connections: Vec<ConnectionRecord>,
    ) -> Result<(), StoreError> {
        for connection in connections {
            self.connections.insert(connection.id.clone(), connection);
        }
        self.services.insert(service.id.clone(), service);
        Ok(())
    }

    async fn service(&self, id: &ServiceId) -> Result<Option<ServiceRecord>, StoreError> {
        Ok(self.services.get(id).map(|r| r.clone()))
    }

    async fn services(&self) -> Result<Vec<ServiceRecord>, StoreError> {
        let mut all: Vec<_> = self.services.iter().map(|r| r.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn connection(&self, id: &ConnectionId) -> Result<Option<ConnectionRecord>, StoreError> {
        Ok(self.connections.get(id).map(|r| r.clone()))
    }

    async fn connections_of(&self, id: &ServiceId) -> Result<Vec<ConnectionRecord>, StoreError> {
        let mut owned: Vec<_> = self
            .connections
            .iter()
            .filter(|r| &r.service == id)
            .map(|r| r.clone())
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned)
    }

    async fn update_service_endpoint(
        &self,
        id: &ServiceId,
        endpoint: EndPoint,
    ) -> Result<(), StoreError> {
        let Some(mut record) = self.services.get_mut(id) else {
            return Err(StoreError::Backend(format!("service {id} not stored")));
        };
        match record.endpoints.iter_mut().find(|ep| ep.sip == endpoint.sip) {
            Some(existing) => *existing = endpoint,
            None => record.endpoints.push(endpoint),
        }
        Ok(())
    }

    async fn remove_service(&self, id: &ServiceId) -> Result<(), StoreError> {
        self.services.remove(id);
        self.connections.retain(|_, c| &c.service != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_record(id: &str) -> (ServiceRecord, Vec<ConnectionRecord>) {
        let service = ServiceId::new(id);
        let per_node = ConnectionRecord::for_node(
            &service,
            NodeId::new("n1"),
            vec![EdgePointRef::new("n1", "n1:1"), EdgePointRef::new("n1", "n1:2")],
        );
        let aggregate = ConnectionRecord::aggregate(
            &service,
            vec![EdgePointRef::new("n1", "n1:1")],
            vec![per_node.id.clone()],
        );
        let record = ServiceRecord {
            id: service,
            endpoints: vec![EndPoint::at(EdgePointRef::new("n1", "n1:1"))],
            aggregate_connection: aggregate.id.clone(),
            created_at: Utc::now(),
        };
        (record, vec![per_node, aggregate])
    }

    #[tokio::test]
    async fn insert_and_load_round_trip() {
        let store = InMemoryServiceStore::new();
        let (record, connections) = service_record("cs:1");
        let id = record.id.clone();

        store.insert_service(record.clone(), connections).await.unwrap();

        assert_eq!(store.service(&id).await.unwrap(), Some(record));
        assert_eq!(store.connections_of(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn remove_drops_service_and_connections() {
        let store = InMemoryServiceStore::new();
        let (record, connections) = service_record("cs:1");
        let id = record.id.clone();
        let conn_id = connections[0].id.clone();
        store.insert_service(record, connections).await.unwrap();

        store.remove_service(&id).await.unwrap();

        assert_eq!(store.service(&id).await.unwrap(), None);
        assert_eq!(store.connection(&conn_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn endpoint_update_replaces_matching_sip() {
        let store = InMemoryServiceStore::new();
        let (record, connections) = service_record("cs:1");
        let id = record.id.clone();
        let sip = record.endpoints[0].sip.clone();
        store.insert_service(record, connections).await.unwrap();

        let replacement = EndPoint {
            sip,
            role: Some("updated".into()),
            edge_point: Some(EdgePointRef::new("n1", "n1:1")),
        };
        store.update_service_endpoint(&id, replacement).await.unwrap();

        let stored = store.service(&id).await.unwrap().unwrap();
        assert_eq!(stored.endpoints[0].role.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn services_listed_in_creation_order() {
        let store = InMemoryServiceStore::new();
        for id in ["cs:a", "cs:b", "cs:c"] {
            let (record, connections) = service_record(id);
            store.insert_service(record, connections).await.unwrap();
        }

        let listed = store.services().await.unwrap();
        assert_eq!(listed.len(), 3);
    }
}
