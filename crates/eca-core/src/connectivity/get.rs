//! Read actions over persisted services and connections

use super::ConnectivityController;
use crate::error::ServiceError;
use crate::store::{ConnectionRecord, ServiceRecord, ServiceStore};
use eca_model::{ConnectionId, ServiceId};

pub(super) async fn service_details(
    c: &ConnectivityController,
    id: &ServiceId,
) -> Result<ServiceRecord, ServiceError> {
    c.store()
        .service(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(id.clone()))
}

pub(super) async fn service_list(
    c: &ConnectivityController,
) -> Result<Vec<ServiceRecord>, ServiceError> {
    Ok(c.store().services().await?)
}

/// Look the id up as a connection first; failing that, treat it as a
/// service id and return that service's aggregate connection.
pub(super) async fn connection_details(
    c: &ConnectivityController,
    id: &str,
) -> Result<ConnectionRecord, ServiceError> {
    if let Some(connection) = c.store().connection(&ConnectionId::new(id)).await? {
        return Ok(connection);
    }
    if let Some(service) = c.store().service(&ServiceId::new(id)).await? {
        if let Some(aggregate) = c.store().connection(&service.aggregate_connection).await? {
            return Ok(aggregate);
        }
    }
    Err(ServiceError::ConnectionNotFound(ConnectionId::new(id)))
}
