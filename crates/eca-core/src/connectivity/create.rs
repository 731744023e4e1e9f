//! Create connectivity action

use super::ConnectivityController;
use crate::error::ServiceError;
use crate::store::{ConnectionRecord, ServiceRecord, ServiceStore};
use crate::types::CreateRequest;
use chrono::Utc;
use eca_driver::BuilderContext;
use eca_model::{EndPoint, ServiceId, Subrequest};
use eca_topology::{TopologyError, TopologyService};

/// One create request: validate, resolve, decompose, activate, persist
pub(super) struct CreateAction<'a> {
    controller: &'a ConnectivityController,
    request: CreateRequest,
}

impl<'a> CreateAction<'a> {
    pub(super) fn new(controller: &'a ConnectivityController, request: CreateRequest) -> Self {
        Self {
            controller,
            request,
        }
    }

    pub(super) async fn run(self) -> Result<ServiceRecord, ServiceError> {
        let c = self.controller;
        tracing::debug!("running create connectivity task");

        let validation = c.validator().check_create(&self.request, c.config());
        if !validation.is_valid() {
            return Err(ServiceError::InvalidInput(validation.summary()));
        }

        let endpoints = resolve_endpoints(c, &self.request.endpoints).await?;

        let service_id = ServiceId::generate();
        let _claim = c.begin_exclusive(&service_id)?;

        let subrequests = c
            .decomposer()
            .decompose(&endpoints, &self.request.constraints)
            .await?;

        let mut tx = c.new_transaction(&service_id);
        let context = BuilderContext::new();
        for subrequest in &subrequests {
            c.publish_hint(&context, subrequest);
            let driver = c.registry().resolve_subrequest(subrequest, &context)?;
            tx.add_driver(driver, subrequest.clone());
        }

        let result = tx.activate().await?;
        if !result.is_successful() {
            let reason = result
                .message
                .unwrap_or_else(|| "activation failed".to_string());
            tracing::warn!(service = %service_id, %reason, "create connectivity failed");
            return Err(ServiceError::ActivationFailed(reason));
        }

        let (record, connections) = build_records(&service_id, &endpoints, &subrequests);
        c.store().insert_service(record.clone(), connections).await?;
        tracing::info!(service = %service_id, connections = subrequests.len() + 1,
            "connectivity service activated");
        Ok(record)
    }
}

/// Resolve the requested endpoints against the current snapshot; an
/// unknown sip is a caller error, not a pathfinding miss.
async fn resolve_endpoints(
    c: &ConnectivityController,
    endpoints: &[EndPoint],
) -> Result<Vec<EndPoint>, ServiceError> {
    let mut resolved = Vec::with_capacity(endpoints.len());
    for ep in endpoints {
        let port = c.topology().resolve_endpoint(&ep.sip).await.map_err(|err| match err {
            TopologyError::EndpointNotFound(sip) => {
                ServiceError::InvalidInput(format!("service interface point not found: {sip}"))
            }
            other => ServiceError::Topology(other),
        })?;
        resolved.push(ep.clone().resolved_to(port));
    }
    Ok(resolved)
}

/// One connection record per traversed node plus the end-to-end aggregate
/// carrying the route
fn build_records(
    service_id: &ServiceId,
    endpoints: &[EndPoint],
    subrequests: &[Subrequest],
) -> (ServiceRecord, Vec<ConnectionRecord>) {
    let per_node: Vec<ConnectionRecord> = subrequests
        .iter()
        .map(|s| {
            ConnectionRecord::for_node(
                service_id,
                s.node.clone(),
                s.endpoints
                    .iter()
                    .filter_map(|ep| ep.edge_point.clone())
                    .collect(),
            )
        })
        .collect();

    let route = per_node.iter().map(|conn| conn.id.clone()).collect();
    let aggregate = ConnectionRecord::aggregate(
        service_id,
        endpoints
            .iter()
            .filter_map(|ep| ep.edge_point.clone())
            .collect(),
        route,
    );

    let record = ServiceRecord {
        id: service_id.clone(),
        endpoints: endpoints.to_vec(),
        aggregate_connection: aggregate.id.clone(),
        created_at: Utc::now(),
    };

    let mut connections = per_node;
    connections.push(aggregate);
    (record, connections)
}
