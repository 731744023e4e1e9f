//! Update connectivity action

use super::ConnectivityController;
use crate::error::ServiceError;
use crate::store::{ServiceRecord, ServiceStore};
use crate::types::UpdateRequest;
use eca_driver::BuilderContext;
use eca_model::Subrequest;
use eca_topology::{TopologyError, TopologyService};

/// One update request: a one-driver transaction against the node owning
/// the updated endpoint
pub(super) struct UpdateAction<'a> {
    controller: &'a ConnectivityController,
    request: UpdateRequest,
}

impl<'a> UpdateAction<'a> {
    pub(super) fn new(controller: &'a ConnectivityController, request: UpdateRequest) -> Self {
        Self {
            controller,
            request,
        }
    }

    pub(super) async fn run(self) -> Result<ServiceRecord, ServiceError> {
        let c = self.controller;
        let id = &self.request.service_id;
        tracing::debug!(service = %id, "running update connectivity task");

        let validation = c.validator().check_update(&self.request);
        if !validation.is_valid() {
            return Err(ServiceError::InvalidInput(validation.summary()));
        }

        if c.store().service(id).await?.is_none() {
            return Err(ServiceError::NotFound(id.clone()));
        }

        let _claim = c.begin_exclusive(id)?;

        let port = c
            .topology()
            .resolve_endpoint(&self.request.endpoint.sip)
            .await
            .map_err(|err| match err {
                TopologyError::EndpointNotFound(sip) => ServiceError::InvalidInput(format!(
                    "service interface point not found: {sip}"
                )),
                other => ServiceError::Topology(other),
            })?;
        let endpoint = self.request.endpoint.clone().resolved_to(port.clone());

        let snapshot = c.topology().topology().await?;
        let mut subrequest = Subrequest::new(port.node.clone(), [endpoint.clone()]);
        subrequest.driver_hint = snapshot.driver_of(&port.node).cloned();

        let context = BuilderContext::new();
        c.publish_hint(&context, &subrequest);
        let driver = c.registry().resolve_subrequest(&subrequest, &context)?;

        let mut tx = c.new_transaction(id);
        tx.add_driver(driver, subrequest);

        let result = tx.update().await?;
        if !result.is_successful() {
            let reason = result
                .message
                .unwrap_or_else(|| "update failed".to_string());
            tracing::warn!(service = %id, %reason, "update connectivity failed");
            return Err(ServiceError::ActivationFailed(reason));
        }

        c.store().update_service_endpoint(id, endpoint).await?;
        tracing::info!(service = %id, "connectivity service updated");
        c.store()
            .service(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }
}
