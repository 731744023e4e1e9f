//! Topology query errors

use eca_model::SipId;

/// Errors surfaced by the topology query service
#[derive(Debug, Clone, thiserror::Error)]
pub enum TopologyError {
    /// No edge point maps the requested service interface point
    #[error("service interface point not found: {0}")]
    EndpointNotFound(SipId),

    /// The snapshot holds no nodes at all
    #[error("topology has no nodes")]
    EmptyTopology,

    /// The topology source could not be read
    #[error("topology unavailable: {0}")]
    Unavailable(String),
}
