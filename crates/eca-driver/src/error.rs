//! Driver and registry error types

use eca_model::NodeId;

/// Errors raised by a driver while talking to its network element
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    /// The element rejected the pushed configuration
    #[error("device rejected configuration: {0}")]
    Device(String),

    /// The management session to the element failed
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Errors raised while resolving a driver for a subrequest.
///
/// Both variants are configuration errors in the registered builder set and
/// are surfaced verbatim; ambiguity in particular is never resolved by
/// priority, since silently picking one builder could push the wrong vendor
/// configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// No registered builder claims the port combination
    #[error("no activation driver found for {ports}")]
    DriverNotFound {
        /// Ports the resolution was attempted for
        ports: String,
    },

    /// More than one builder claims the port combination
    #[error("{count} activation drivers claim {ports}")]
    DriverAmbiguous {
        /// Ports the resolution was attempted for
        ports: String,
        /// Number of claimants
        count: usize,
    },

    /// A subrequest reached the registry without resolved edge points
    #[error("subrequest for {node} carries no resolved edge points")]
    NoEndpoints {
        /// Node the subrequest targets
        node: NodeId,
    },
}
