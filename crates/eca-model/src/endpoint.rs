//! Edge point references and request-level endpoints

use crate::ids::{EdgePointId, NodeId, SipId};
use serde::{Deserialize, Serialize};

/// A terminable port on a network element: node id plus local port id.
///
/// Immutable value; owned by whichever node, link or subrequest references
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgePointRef {
    /// Owning network element
    pub node: NodeId,
    /// Port local to that element
    pub edge_point: EdgePointId,
}

impl EdgePointRef {
    /// Create a reference to `edge_point` on `node`
    #[inline]
    #[must_use]
    pub fn new(node: impl Into<NodeId>, edge_point: impl Into<EdgePointId>) -> Self {
        Self {
            node: node.into(),
            edge_point: edge_point.into(),
        }
    }
}

impl std::fmt::Display for EdgePointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.node, self.edge_point)
    }
}

/// A request-level endpoint.
///
/// Callers reference a global service interface point; the topology lookup
/// resolves it to a concrete [`EdgePointRef`] before decomposition. Created
/// per incoming request and discarded once the request completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndPoint {
    /// Caller-supplied service interface point reference
    pub sip: SipId,
    /// Optional caller-supplied role attribute
    pub role: Option<String>,
    /// Resolved system port; `None` until resolution
    pub edge_point: Option<EdgePointRef>,
}

impl EndPoint {
    /// Endpoint referencing `sip`, not yet resolved
    #[inline]
    #[must_use]
    pub fn new(sip: impl Into<SipId>) -> Self {
        Self {
            sip: sip.into(),
            role: None,
            edge_point: None,
        }
    }

    /// With a caller-supplied role attribute
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Attach the resolved system port
    #[inline]
    #[must_use]
    pub fn resolved_to(mut self, edge_point: EdgePointRef) -> Self {
        self.edge_point = Some(edge_point);
        self
    }

    /// Endpoint already bound to a system port, without a sip mapping.
    ///
    /// Used when reconstituting per-node work from stored connection
    /// records, where only the port is known.
    #[must_use]
    pub fn at(edge_point: EdgePointRef) -> Self {
        Self {
            sip: SipId::new(format!("sip:{edge_point}")),
            role: None,
            edge_point: Some(edge_point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolution_attaches_port() {
        let ep = EndPoint::new("sip:n1:1").resolved_to(EdgePointRef::new("n1", "n1:1"));
        assert_eq!(ep.sip, SipId::new("sip:n1:1"));
        assert_eq!(ep.edge_point, Some(EdgePointRef::new("n1", "n1:1")));
    }

    #[test]
    fn endpoint_at_port_is_resolved() {
        let ep = EndPoint::at(EdgePointRef::new("n2", "n2:3"));
        assert!(ep.edge_point.is_some());
    }

    #[test]
    fn edge_point_display() {
        assert_eq!(EdgePointRef::new("n1", "n1:2").to_string(), "n1/n1:2");
    }
}
