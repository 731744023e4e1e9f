//! ECA Topology - graph snapshot and query service
//!
//! Read-only view of the network consumed by the decomposer:
//! - [`Node`], [`EdgePoint`], [`Link`]: the graph elements
//! - [`TopologySnapshot`]: an immutable snapshot of nodes and links
//! - [`TopologyService`]: the query collaborator (snapshot + sip resolution)
//! - [`SharedTopologyService`]: in-process implementation whose snapshot is
//!   swapped atomically by whatever feeds topology into the controller
//!
//! The core never mutates topology; it only reads whichever snapshot was
//! current when a request began.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod graph;
mod service;

// Re-exports
pub use error::TopologyError;
pub use graph::{EdgePoint, Link, Node, TopologySnapshot};
pub use service::{SharedTopologyService, TopologyService};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
