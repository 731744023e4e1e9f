//! Delete connectivity action

use super::ConnectivityController;
use crate::error::ServiceError;
use crate::store::{ServiceStore, StoreError};
use eca_driver::BuilderContext;
use eca_model::{EndPoint, ServiceId, Subrequest};
use eca_topology::TopologyService;

/// One delete request: reconstitute per-node work from the stored
/// connections, deactivate, then drop the records
pub(super) struct DeleteAction<'a> {
    controller: &'a ConnectivityController,
    id: ServiceId,
}

impl<'a> DeleteAction<'a> {
    pub(super) fn new(controller: &'a ConnectivityController, id: ServiceId) -> Self {
        Self { controller, id }
    }

    pub(super) async fn run(self) -> Result<(), ServiceError> {
        let c = self.controller;
        tracing::debug!(service = %self.id, "running delete connectivity task");

        // a service that was never created fails before any driver call
        if c.store().service(&self.id).await?.is_none() {
            return Err(ServiceError::NotFound(self.id.clone()));
        }

        let _claim = c.begin_exclusive(&self.id)?;

        let connections = c.store().connections_of(&self.id).await?;
        let snapshot = c.topology().topology().await?;

        let mut tx = c.new_transaction(&self.id);
        let context = BuilderContext::new();
        for connection in &connections {
            // the aggregate is bookkeeping only; drivers act per node
            let Some(node) = &connection.node else {
                continue;
            };
            let mut subrequest = Subrequest::new(
                node.clone(),
                connection.endpoints.iter().cloned().map(EndPoint::at),
            );
            subrequest.driver_hint = snapshot.driver_of(node).cloned();

            c.publish_hint(&context, &subrequest);
            let driver = c.registry().resolve_subrequest(&subrequest, &context)?;
            tx.add_driver(driver, subrequest);
        }

        if tx.is_empty() {
            return Err(ServiceError::Store(StoreError::Backend(format!(
                "service {} has no per-node connections",
                self.id
            ))));
        }

        let result = tx.deactivate().await?;
        if !result.is_successful() {
            let reason = result
                .message
                .unwrap_or_else(|| "deactivation failed".to_string());
            tracing::warn!(service = %self.id, %reason, "delete connectivity failed");
            return Err(ServiceError::ActivationFailed(reason));
        }

        c.store().remove_service(&self.id).await?;
        tracing::info!(service = %self.id, "connectivity service deactivated and removed");
        Ok(())
    }
}
