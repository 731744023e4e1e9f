//! Topology graph elements and snapshots

use eca_model::{DriverId, EdgePointId, EdgePointRef, NodeId, OperationalState, SipId};
use serde::{Deserialize, Serialize};

/// A port owned by a node, optionally exposed as a service interface point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePoint {
    /// Port id, unique within the owning node
    pub id: EdgePointId,
    /// Service interface point mapped onto this port, if any
    pub sip: Option<SipId>,
}

impl EdgePoint {
    /// Port with no sip mapping
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<EdgePointId>) -> Self {
        Self {
            id: id.into(),
            sip: None,
        }
    }

    /// With a mapped service interface point
    #[inline]
    #[must_use]
    pub fn with_sip(mut self, sip: impl Into<SipId>) -> Self {
        self.sip = Some(sip.into());
        self
    }
}

/// A network element and the edge points it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Element id
    pub id: NodeId,
    /// Driver family that configures this element, if advertised
    pub driver: Option<DriverId>,
    /// Ports owned by the element
    pub edge_points: Vec<EdgePoint>,
}

impl Node {
    /// Node with no driver advertisement
    #[must_use]
    pub fn new(id: impl Into<NodeId>, edge_points: Vec<EdgePoint>) -> Self {
        Self {
            id: id.into(),
            driver: None,
            edge_points,
        }
    }

    /// With an advertised driver family
    #[inline]
    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<DriverId>) -> Self {
        self.driver = Some(driver.into());
        self
    }
}

/// An undirected edge between two node ports.
///
/// Only links whose state is enabled participate in pathfinding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// One end of the link
    pub a: EdgePointRef,
    /// The other end
    pub b: EdgePointRef,
    /// Whether the link may carry traffic
    pub state: OperationalState,
}

impl Link {
    /// Link between `a` and `b` in the given state
    #[inline]
    #[must_use]
    pub fn new(a: EdgePointRef, b: EdgePointRef, state: OperationalState) -> Self {
        Self { a, b, state }
    }

    /// The end of this link terminating on `node`, if any.
    ///
    /// For pathfinding the link is undirected, so either end qualifies.
    #[must_use]
    pub fn end_on(&self, node: &NodeId) -> Option<&EdgePointRef> {
        if &self.a.node == node {
            Some(&self.a)
        } else if &self.b.node == node {
            Some(&self.b)
        } else {
            None
        }
    }

    /// The end of this link not terminating on `node`, if `node` owns the
    /// other end
    #[must_use]
    pub fn far_end(&self, node: &NodeId) -> Option<&EdgePointRef> {
        if &self.a.node == node {
            Some(&self.b)
        } else if &self.b.node == node {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// An immutable snapshot of the topology graph.
///
/// Nodes and links keep their insertion order, which keeps pathfinding
/// deterministic for a fixed graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl TopologySnapshot {
    /// Snapshot over `nodes` and `links`
    #[inline]
    #[must_use]
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    /// All nodes, in insertion order
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links, in insertion order
    #[inline]
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Links usable for pathfinding
    pub fn enabled_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.state.is_enabled())
    }

    /// Resolve a service interface point to the port exposing it
    #[must_use]
    pub fn resolve_sip(&self, sip: &SipId) -> Option<EdgePointRef> {
        self.nodes.iter().find_map(|node| {
            node.edge_points
                .iter()
                .find(|ep| ep.sip.as_ref() == Some(sip))
                .map(|ep| EdgePointRef {
                    node: node.id.clone(),
                    edge_point: ep.id.clone(),
                })
        })
    }

    /// Driver family advertised by `node`, if any
    #[must_use]
    pub fn driver_of(&self, node: &NodeId) -> Option<&DriverId> {
        self.node(node).and_then(|n| n.driver.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(node: &str, ep: &str) -> EdgePointRef {
        EdgePointRef::new(node, ep)
    }

    fn snapshot() -> TopologySnapshot {
        TopologySnapshot::new(
            vec![
                Node::new(
                    "n1",
                    vec![
                        EdgePoint::new("n1:1").with_sip("sip:n1:1"),
                        EdgePoint::new("n1:2").with_sip("sip:n1:2"),
                    ],
                )
                .with_driver("d1"),
                Node::new("n2", vec![EdgePoint::new("n2:1").with_sip("sip:n2:1")]),
            ],
            vec![Link::new(
                port("n1", "n1:1"),
                port("n2", "n2:1"),
                OperationalState::Enabled,
            )],
        )
    }

    #[test]
    fn sip_resolution_finds_owning_port() {
        let topo = snapshot();
        assert_eq!(
            topo.resolve_sip(&SipId::new("sip:n1:2")),
            Some(port("n1", "n1:2"))
        );
        assert_eq!(topo.resolve_sip(&SipId::new("sip:n9:9")), None);
    }

    #[test]
    fn links_are_undirected() {
        let topo = snapshot();
        let link = &topo.links()[0];
        assert_eq!(link.end_on(&NodeId::new("n2")), Some(&port("n2", "n2:1")));
        assert_eq!(link.far_end(&NodeId::new("n2")), Some(&port("n1", "n1:1")));
        assert_eq!(link.end_on(&NodeId::new("n3")), None);
    }

    #[test]
    fn disabled_links_excluded_from_enabled_iter() {
        let mut topo = snapshot();
        topo.links = vec![Link::new(
            port("n1", "n1:1"),
            port("n2", "n2:1"),
            OperationalState::Disabled,
        )];
        assert_eq!(topo.enabled_links().count(), 0);
    }

    #[test]
    fn node_driver_lookup() {
        let topo = snapshot();
        assert_eq!(topo.driver_of(&NodeId::new("n1")), Some(&DriverId::new("d1")));
        assert_eq!(topo.driver_of(&NodeId::new("n2")), None);
    }
}
