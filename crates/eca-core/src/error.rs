//! Error types for the activation pipeline
//!
//! Every recoverable condition is an explicit variant: invalid input, no
//! path, driver resolution failures, activation failures and same-id
//! contention. Callers match on what happened instead of catching a
//! generic failure.

use eca_driver::RegistryError;
use eca_model::{ConnectionId, ServiceId, SipId};
use eca_topology::TopologyError;

/// Top-level error returned by the orchestration surface
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed request, rejected before any graph or driver work
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// The topology holds no enabled-link route between the endpoints
    #[error("no route between requested endpoints")]
    NoPath,

    /// Driver resolution failed (configuration error in the builder set)
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A driver failed during the activation transaction; already-activated
    /// drivers were rolled back
    #[error("activation failed: {0}")]
    ActivationFailed(String),

    /// No service persisted under the given id
    #[error("service {0} not found")]
    NotFound(ServiceId),

    /// No connection persisted under the given id
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// Another transaction for the same service id is in flight
    #[error("service {0} busy: another request is in flight")]
    Busy(ServiceId),

    /// The controller was shut down and accepts no further requests
    #[error("controller shutting down")]
    ShuttingDown,

    /// The topology collaborator failed
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The persistence collaborator failed
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Transaction misuse (internal invariant violation)
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl ServiceError {
    /// Whether the caller may retry the same request later without changing
    /// it (topology or contention may have moved on)
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoPath | Self::Busy(_))
    }
}

/// Errors raised while decomposing a request into subrequests
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecompositionError {
    /// Fewer than two endpoints supplied
    #[error("at least two endpoints required")]
    NotEnoughEndpoints,

    /// Service interface points that no node in the snapshot exposes
    #[error("service interface points not found: {0:?}")]
    UnknownServiceInterfacePoints(Vec<SipId>),

    /// The snapshot holds no nodes at all
    #[error("topology has no nodes")]
    EmptyTopology,

    /// No enabled-link route connects the endpoints
    #[error("no route between requested endpoints")]
    NoPath,

    /// The topology collaborator failed
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

impl From<DecompositionError> for ServiceError {
    fn from(err: DecompositionError) -> Self {
        match err {
            DecompositionError::NoPath => Self::NoPath,
            DecompositionError::NotEnoughEndpoints
            | DecompositionError::UnknownServiceInterfacePoints(_) => {
                Self::InvalidInput(err.to_string())
            }
            DecompositionError::EmptyTopology => Self::Topology(TopologyError::EmptyTopology),
            DecompositionError::Topology(e) => Self::Topology(e),
        }
    }
}

/// Transaction misuse errors.
///
/// These signal a caller bug rather than a device failure: a transaction is
/// single-use and needs at least one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// No drivers were added before running
    #[error("at least one driver required")]
    NoDrivers,

    /// The transaction was already run once
    #[error("transaction already consumed")]
    AlreadyRun,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_is_recoverable() {
        assert!(ServiceError::NoPath.is_recoverable());
        assert!(ServiceError::Busy(ServiceId::new("cs:1")).is_recoverable());
        assert!(!ServiceError::InvalidInput("x".into()).is_recoverable());
    }

    #[test]
    fn decomposition_no_path_maps_to_service_no_path() {
        let err: ServiceError = DecompositionError::NoPath.into();
        assert!(matches!(err, ServiceError::NoPath));
    }

    #[test]
    fn unknown_sips_map_to_invalid_input() {
        let err: ServiceError =
            DecompositionError::UnknownServiceInterfacePoints(vec![SipId::new("sip:x")]).into();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn error_messages_are_lowercase_and_specific() {
        let err = ServiceError::ActivationFailed("device rejected configuration".into());
        assert!(err.to_string().starts_with("activation failed"));
    }
}
