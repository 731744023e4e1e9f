//! Per-node configuration subrequests

use crate::endpoint::EndPoint;
use crate::ids::{DriverId, NodeId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The unit of per-node work produced by decomposition.
///
/// Holds exactly the edge points on one node that must be interconnected:
/// two for transit nodes (the two link-facing ports), one or two for
/// terminal nodes (the requested endpoint plus, when the node is also
/// transit, the onward link port). Consumed once by the driver registry and
/// the activation transaction, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subrequest {
    /// Node this work applies to
    pub node: NodeId,
    /// Edge points to interconnect, in traversal order
    pub endpoints: SmallVec<[EndPoint; 2]>,
    /// Driver family advertised by the node, if any
    pub driver_hint: Option<DriverId>,
}

impl Subrequest {
    /// Subrequest for `node` interconnecting `endpoints`
    #[must_use]
    pub fn new(node: impl Into<NodeId>, endpoints: impl IntoIterator<Item = EndPoint>) -> Self {
        Self {
            node: node.into(),
            endpoints: endpoints.into_iter().collect(),
            driver_hint: None,
        }
    }

    /// With the node's advertised driver family
    #[inline]
    #[must_use]
    pub fn with_driver_hint(mut self, hint: DriverId) -> Self {
        self.driver_hint = Some(hint);
        self
    }
}
