//! ECA Model - shared value types
//!
//! The vocabulary every other crate speaks:
//! - Identifiers for nodes, edge points, service interface points, drivers,
//!   services and connections
//! - [`EdgePointRef`]: a terminable port on a network element
//! - [`EndPoint`]: a request-level endpoint, resolved against the topology
//! - [`Subrequest`]: the per-node unit of configuration work
//! - [`OperationalState`]: link state gating pathfinding

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod endpoint;
mod ids;
mod state;
mod subrequest;

// Re-exports
pub use endpoint::{EdgePointRef, EndPoint};
pub use ids::{ConnectionId, DriverId, EdgePointId, NodeId, ServiceId, SipId};
pub use state::OperationalState;
pub use subrequest::Subrequest;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
