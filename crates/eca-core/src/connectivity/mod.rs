//! Connectivity orchestration surface
//!
//! The controller behind the public API: create / delete / update / get /
//! list. Each operation validates input, drives the decomposer and driver
//! registry to build an activation transaction, runs it and persists or
//! removes the resulting records.
//!
//! Concurrency model: requests for different service ids run fully in
//! parallel, bounded by the configured limit; create/update/delete for the
//! same id are serialized by rejecting the later request with a busy error.

mod create;
mod delete;
mod get;
mod update;

use crate::decomposer::RequestDecomposer;
use crate::error::ServiceError;
use crate::store::{ConnectionRecord, ServiceRecord, ServiceStore};
use crate::transaction::ActivationTransaction;
use crate::types::{ControllerConfig, CreateRequest, UpdateRequest};
use crate::validator::RequestValidator;
use create::CreateAction;
use dashmap::DashMap;
use delete::DeleteAction;
use eca_driver::{BuilderContext, DriverRegistry, DRIVER_HINT_KEY};
use eca_model::{ServiceId, Subrequest};
use eca_topology::TopologyService;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use update::UpdateAction;

/// The connectivity service controller.
///
/// Safe to share across tasks; every collaborator it holds is either
/// immutable or internally synchronized.
pub struct ConnectivityController {
    config: ControllerConfig,
    topology: Arc<dyn TopologyService>,
    registry: DriverRegistry,
    store: Arc<dyn ServiceStore>,
    validator: RequestValidator,
    decomposer: RequestDecomposer,
    in_flight: DashMap<ServiceId, ()>,
    limiter: Arc<Semaphore>,
}

impl ConnectivityController {
    /// Controller wired to its collaborators
    #[must_use]
    pub fn new(
        config: ControllerConfig,
        topology: Arc<dyn TopologyService>,
        registry: DriverRegistry,
        store: Arc<dyn ServiceStore>,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));
        tracing::info!(
            max_concurrent_requests = config.max_concurrent_requests,
            "connectivity controller initialized"
        );
        Self {
            config,
            decomposer: RequestDecomposer::new(Arc::clone(&topology)),
            topology,
            registry,
            store,
            validator: RequestValidator::new(),
            in_flight: DashMap::new(),
            limiter,
        }
    }

    /// Create a connectivity service between the requested endpoints.
    ///
    /// On success the persisted service record is returned; on any failure
    /// nothing is persisted and already-activated drivers have been rolled
    /// back.
    pub async fn create_connectivity_service(
        &self,
        request: CreateRequest,
    ) -> Result<ServiceRecord, ServiceError> {
        let _permit = self.admit().await?;
        CreateAction::new(self, request).run().await
    }

    /// Deactivate and remove an existing connectivity service
    pub async fn delete_connectivity_service(&self, id: &ServiceId) -> Result<(), ServiceError> {
        let _permit = self.admit().await?;
        DeleteAction::new(self, id.clone()).run().await
    }

    /// Update a single endpoint of an existing service
    pub async fn update_connectivity_service(
        &self,
        request: UpdateRequest,
    ) -> Result<ServiceRecord, ServiceError> {
        let _permit = self.admit().await?;
        UpdateAction::new(self, request).run().await
    }

    /// Details of one persisted service
    pub async fn get_connectivity_service_details(
        &self,
        id: &ServiceId,
    ) -> Result<ServiceRecord, ServiceError> {
        let _permit = self.admit().await?;
        get::service_details(self, id).await
    }

    /// All persisted services
    pub async fn get_connectivity_service_list(&self) -> Result<Vec<ServiceRecord>, ServiceError> {
        let _permit = self.admit().await?;
        get::service_list(self).await
    }

    /// Details of one connection, accepting either a connection id or a
    /// service id (which yields the service's aggregate connection)
    pub async fn get_connection_details(&self, id: &str) -> Result<ConnectionRecord, ServiceError> {
        let _permit = self.admit().await?;
        get::connection_details(self, id).await
    }

    /// Stop admitting requests; in-flight transactions run to completion
    pub fn shutdown(&self) {
        tracing::info!("connectivity controller shutting down");
        self.limiter.close();
    }

    async fn admit(&self) -> Result<SemaphorePermit<'_>, ServiceError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| ServiceError::ShuttingDown)
    }

    /// Claim exclusive access to a service id for the duration of one
    /// mutating operation; a concurrent claim is rejected as busy.
    fn begin_exclusive(&self, id: &ServiceId) -> Result<InFlightGuard<'_>, ServiceError> {
        use dashmap::mapref::entry::Entry;
        match self.in_flight.entry(id.clone()) {
            Entry::Occupied(_) => Err(ServiceError::Busy(id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightGuard {
                    in_flight: &self.in_flight,
                    id: id.clone(),
                })
            }
        }
    }

    fn new_transaction(&self, id: &ServiceId) -> ActivationTransaction {
        ActivationTransaction::new(id.clone()).with_call_timeout(self.config.driver_call_timeout())
    }

    /// Publish the subrequest's driver hint on the builder blackboard so
    /// builders can consult it during resolution
    fn publish_hint(&self, context: &BuilderContext, subrequest: &Subrequest) {
        match &subrequest.driver_hint {
            Some(hint) => context.put(
                DRIVER_HINT_KEY,
                serde_json::Value::String(hint.to_string()),
            ),
            None => context.remove(DRIVER_HINT_KEY),
        }
    }

    pub(crate) fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub(crate) fn topology(&self) -> &Arc<dyn TopologyService> {
        &self.topology
    }

    pub(crate) fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub(crate) fn store(&self) -> &Arc<dyn ServiceStore> {
        &self.store
    }

    pub(crate) fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub(crate) fn decomposer(&self) -> &RequestDecomposer {
        &self.decomposer
    }
}

/// Removes the in-flight claim when the operation ends, success or not
#[derive(Debug)]
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<ServiceId, ()>,
    id: ServiceId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryServiceStore;
    use eca_test_utils::TopologyFixture;

    fn controller() -> ConnectivityController {
        let topology = TopologyFixture::new().node("n1", &["n1:1"]).into_service();
        ConnectivityController::new(
            ControllerConfig::new(),
            Arc::new(topology),
            DriverRegistry::new(vec![]),
            Arc::new(InMemoryServiceStore::new()),
        )
    }

    #[tokio::test]
    async fn exclusive_claim_rejects_second_claim() {
        let controller = controller();
        let id = ServiceId::new("cs:1");

        let guard = controller.begin_exclusive(&id).unwrap();
        let err = controller.begin_exclusive(&id).unwrap_err();
        assert!(matches!(err, ServiceError::Busy(_)));

        drop(guard);
        assert!(controller.begin_exclusive(&id).is_ok());
    }

    #[tokio::test]
    async fn shutdown_rejects_new_requests() {
        let controller = controller();
        controller.shutdown();

        let err = controller
            .get_connectivity_service_list()
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ShuttingDown));
    }
}
