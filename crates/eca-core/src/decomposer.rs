//! Graph-based request decomposition
//!
//! Splits a logical connectivity request into the minimal ordered set of
//! per-node subrequests by walking the live topology snapshot. Only enabled
//! links participate; a route that would need a disabled link is the same as
//! no route at all.

use crate::error::DecompositionError;
use crate::types::Constraints;
use eca_model::{EdgePointRef, EndPoint, NodeId, Subrequest};
use eca_topology::{TopologyService, TopologySnapshot};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Decomposes endpoint sets into per-node subrequests.
///
/// Point-to-point requests are decomposed along a breadth-first shortest
/// path, which keeps the chosen route stable for a fixed snapshot. Requests
/// with more than two endpoints are served best-effort by unioning the
/// pairwise paths; no minimality is guaranteed for them.
pub struct RequestDecomposer {
    topology: Arc<dyn TopologyService>,
}

impl RequestDecomposer {
    /// Decomposer reading from `topology`
    #[must_use]
    pub fn new(topology: Arc<dyn TopologyService>) -> Self {
        tracing::trace!("decomposer initialized");
        Self { topology }
    }

    /// Decompose `endpoints` into one subrequest per traversed node.
    ///
    /// Endpoints may arrive already resolved to a system port; unresolved
    /// ones are resolved against the current snapshot here.
    ///
    /// # Errors
    /// - [`DecompositionError::NotEnoughEndpoints`] for fewer than two
    ///   endpoints
    /// - [`DecompositionError::UnknownServiceInterfacePoints`] when a sip
    ///   maps to no port in the snapshot
    /// - [`DecompositionError::NoPath`] when no enabled-link route connects
    ///   the endpoints
    pub async fn decompose(
        &self,
        endpoints: &[EndPoint],
        constraints: &Constraints,
    ) -> Result<Vec<Subrequest>, DecompositionError> {
        if endpoints.len() < 2 {
            return Err(DecompositionError::NotEnoughEndpoints);
        }

        let snapshot = self.topology.topology().await?;
        if snapshot.nodes().is_empty() {
            return Err(DecompositionError::EmptyTopology);
        }

        let resolved = resolve_endpoints(&snapshot, endpoints)?;
        tracing::debug!(endpoints = resolved.len(), "decomposing request");

        let walk = DecompositionWalk {
            snapshot: &snapshot,
            constraints,
        };
        walk.decompose(&resolved)
    }
}

/// Resolve every endpoint to a system port, collecting the sips that map to
/// nothing.
fn resolve_endpoints(
    snapshot: &TopologySnapshot,
    endpoints: &[EndPoint],
) -> Result<Vec<EndPoint>, DecompositionError> {
    let mut resolved = Vec::with_capacity(endpoints.len());
    let mut missing = Vec::new();

    for ep in endpoints {
        let port = match &ep.edge_point {
            Some(port) if snapshot.node(&port.node).is_some() => Some(port.clone()),
            Some(_) | None => snapshot.resolve_sip(&ep.sip),
        };
        match port {
            Some(port) => resolved.push(ep.clone().resolved_to(port)),
            None => missing.push(ep.sip.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(DecompositionError::UnknownServiceInterfacePoints(missing));
    }
    Ok(resolved)
}

/// One decomposition over one snapshot
struct DecompositionWalk<'a> {
    snapshot: &'a TopologySnapshot,
    constraints: &'a Constraints,
}

/// A node on a computed path with the ports the route enters and leaves by.
/// Terminal nodes leave the respective side empty.
struct PathStep {
    node: NodeId,
    entry: Option<EdgePointRef>,
    exit: Option<EdgePointRef>,
}

impl DecompositionWalk<'_> {
    fn decompose(&self, endpoints: &[EndPoint]) -> Result<Vec<Subrequest>, DecompositionError> {
        // the same port twice cannot be interconnected with itself
        let mut seen = HashSet::new();
        for ep in endpoints {
            if let Some(port) = &ep.edge_point {
                if !seen.insert(port.clone()) {
                    tracing::debug!(%port, "duplicate endpoint port in request");
                    return Err(DecompositionError::NoPath);
                }
            }
        }

        let mut per_node: IndexMap<NodeId, Vec<EndPoint>> = IndexMap::new();
        for (i, a) in endpoints.iter().enumerate() {
            for b in &endpoints[i + 1..] {
                self.merge_pair(a, b, &mut per_node)?;
            }
        }

        Ok(per_node
            .into_iter()
            .map(|(node, eps)| {
                let hint = self.snapshot.driver_of(&node).cloned();
                let mut sub = Subrequest::new(node, eps);
                sub.driver_hint = hint;
                sub
            })
            .collect())
    }

    /// Fold the shortest path between one endpoint pair into the per-node
    /// contributions.
    fn merge_pair(
        &self,
        a: &EndPoint,
        b: &EndPoint,
        per_node: &mut IndexMap<NodeId, Vec<EndPoint>>,
    ) -> Result<(), DecompositionError> {
        let (Some(a_port), Some(b_port)) = (&a.edge_point, &b.edge_point) else {
            // resolve_endpoints has run by now
            return Err(DecompositionError::NoPath);
        };

        if a_port.node == b_port.node {
            // both endpoints terminate on one element, no pathfinding needed
            push_contributions(per_node, a_port.node.clone(), [a.clone(), b.clone()]);
            return Ok(());
        }

        let Some(steps) = self.shortest_path(&a_port.node, &b_port.node) else {
            tracing::info!(from = %a_port, to = %b_port, "no enabled-link route between endpoints");
            return Err(DecompositionError::NoPath);
        };

        for step in steps {
            let mut eps = Vec::with_capacity(2);
            match step.entry {
                Some(port) => eps.push(EndPoint::at(port)),
                None => eps.push(a.clone()),
            }
            match step.exit {
                Some(port) => eps.push(EndPoint::at(port)),
                None => eps.push(b.clone()),
            }
            push_contributions(per_node, step.node, eps);
        }
        Ok(())
    }

    /// Unweighted breadth-first shortest path over enabled links.
    ///
    /// Links are explored in snapshot order, so the route picked among
    /// equal-length candidates is stable for a fixed graph.
    fn shortest_path(&self, from: &NodeId, to: &NodeId) -> Option<Vec<PathStep>> {
        if from == to {
            return Some(vec![PathStep {
                node: from.clone(),
                entry: None,
                exit: None,
            }]);
        }

        // predecessor: node -> (previous node, previous node's exit port,
        // this node's entry port)
        let mut predecessor: HashMap<NodeId, (NodeId, EdgePointRef, EdgePointRef)> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::from([from.clone()]);
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::from([(from.clone(), 0)]);

        while let Some((current, hops)) = queue.pop_front() {
            if let Some(limit) = self.constraints.max_hops {
                if hops >= limit {
                    continue;
                }
            }
            for link in self.snapshot.enabled_links() {
                let (Some(near), Some(far)) = (link.end_on(&current), link.far_end(&current))
                else {
                    continue;
                };
                if !visited.insert(far.node.clone()) {
                    continue;
                }
                predecessor.insert(far.node.clone(), (current.clone(), near.clone(), far.clone()));
                if far.node == *to {
                    return reconstruct(from, to, &predecessor);
                }
                queue.push_back((far.node.clone(), hops + 1));
            }
        }
        None
    }
}

/// Rebuild the path steps from the predecessor map, back to front.
fn reconstruct(
    from: &NodeId,
    to: &NodeId,
    predecessor: &HashMap<NodeId, (NodeId, EdgePointRef, EdgePointRef)>,
) -> Option<Vec<PathStep>> {
    let mut steps = VecDeque::new();
    let mut cursor = to.clone();
    let mut exit = None;

    loop {
        if cursor == *from {
            steps.push_front(PathStep {
                node: cursor,
                entry: None,
                exit,
            });
            return Some(steps.into());
        }
        let (prev_node, prev_exit, entry) = predecessor.get(&cursor)?.clone();
        steps.push_front(PathStep {
            node: cursor,
            entry: Some(entry),
            exit,
        });
        exit = Some(prev_exit);
        cursor = prev_node;
    }
}

/// Append endpoints to a node's contribution, skipping ports already
/// claimed for that node by an earlier pair.
fn push_contributions(
    per_node: &mut IndexMap<NodeId, Vec<EndPoint>>,
    node: NodeId,
    endpoints: impl IntoIterator<Item = EndPoint>,
) {
    let entry = per_node.entry(node).or_default();
    for ep in endpoints {
        if !entry.iter().any(|existing| existing.edge_point == ep.edge_point) {
            entry.push(ep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eca_model::{DriverId, OperationalState};
    use eca_test_utils::{ep, TopologyFixture};
    use pretty_assertions::assert_eq;

    fn decomposer(fixture: TopologyFixture) -> RequestDecomposer {
        RequestDecomposer::new(Arc::new(fixture.into_service()))
    }

    #[tokio::test]
    async fn empty_node_inventory_fails() {
        let decomposer = decomposer(TopologyFixture::new());

        let err = decomposer
            .decompose(&[ep("n1:1"), ep("n1:2")], &Constraints::none())
            .await
            .unwrap_err();
        assert!(matches!(err, DecompositionError::EmptyTopology));
    }

    #[tokio::test]
    async fn single_endpoint_rejected() {
        let fixture = TopologyFixture::new().node("n1", &["n1:1"]);
        let decomposer = decomposer(fixture);

        let err = decomposer
            .decompose(&[ep("n1:1")], &Constraints::none())
            .await
            .unwrap_err();
        assert!(matches!(err, DecompositionError::NotEnoughEndpoints));
    }

    #[tokio::test]
    async fn single_node_pair_yields_one_subrequest() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2", "n1:3"])
            .node("n2", &["n2:1", "n2:2", "n2:3"]);
        let decomposer = decomposer(fixture);

        let decomposed = decomposer
            .decompose(&[ep("n1:1"), ep("n1:2")], &Constraints::none())
            .await
            .unwrap();

        assert_eq!(decomposed.len(), 1);
        assert_eq!(decomposed[0].node, NodeId::new("n1"));
        assert_eq!(decomposed[0].endpoints.len(), 2);
    }

    #[tokio::test]
    async fn same_endpoint_twice_is_no_path() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2", "n1:3"])
            .node("n2", &["n2:1", "n2:2", "n2:3"]);
        let decomposer = decomposer(fixture);

        let err = decomposer
            .decompose(&[ep("n1:1"), ep("n1:1")], &Constraints::none())
            .await
            .unwrap_err();
        assert!(matches!(err, DecompositionError::NoPath));
    }

    #[tokio::test]
    async fn unknown_endpoint_is_invalid_input() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2", "n1:3"])
            .node("n2", &["n2:1", "n2:2", "n2:3"]);
        let decomposer = decomposer(fixture);

        let err = decomposer
            .decompose(&[ep("n1:1"), ep("n3:1")], &Constraints::none())
            .await
            .unwrap_err();
        match err {
            DecompositionError::UnknownServiceInterfacePoints(missing) => {
                assert_eq!(missing, vec![eca_model::SipId::new("n3:1")]);
            }
            other => panic!("expected unknown sips, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnected_nodes_have_no_path() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2", "n1:3"])
            .node("n2", &["n2:1", "n2:2", "n2:3"]);
        let decomposer = decomposer(fixture);

        let err = decomposer
            .decompose(&[ep("n1:1"), ep("n2:2")], &Constraints::none())
            .await
            .unwrap_err();
        assert!(matches!(err, DecompositionError::NoPath));
    }

    #[tokio::test]
    async fn two_linked_nodes_yield_two_subrequests() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2", "n1:3"])
            .node("n2", &["n2:1", "n2:2", "n2:3"])
            .node("n3", &["n3:1", "n3:2", "n3:3"])
            .link("n1", "n1:1", "n2", "n2:1")
            .link("n2", "n2:3", "n3", "n3:3");
        let decomposer = decomposer(fixture);

        let decomposed = decomposer
            .decompose(&[ep("n1:2"), ep("n2:2")], &Constraints::none())
            .await
            .unwrap();

        assert_eq!(decomposed.len(), 2);
        // terminal subrequests pair the requested port with the link port
        assert_eq!(decomposed[0].node, NodeId::new("n1"));
        assert_eq!(
            port_names(&decomposed[0]),
            vec!["n1:2".to_string(), "n1:1".to_string()]
        );
        assert_eq!(
            port_names(&decomposed[1]),
            vec!["n2:1".to_string(), "n2:2".to_string()]
        );
    }

    #[tokio::test]
    async fn three_node_chain_yields_three_subrequests_in_path_order() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2", "n1:3"])
            .node("n2", &["n2:1", "n2:2", "n2:3"])
            .node("n3", &["n3:1", "n3:2", "n3:3"])
            .link("n1", "n1:1", "n2", "n2:1")
            .link("n2", "n2:3", "n3", "n3:3");
        let decomposer = decomposer(fixture);

        let decomposed = decomposer
            .decompose(&[ep("n1:2"), ep("n3:2")], &Constraints::none())
            .await
            .unwrap();

        assert_eq!(decomposed.len(), 3);
        let nodes: Vec<_> = decomposed.iter().map(|s| s.node.as_str()).collect();
        assert_eq!(nodes, vec!["n1", "n2", "n3"]);
        // the transit node interconnects its two link-facing ports
        assert_eq!(
            port_names(&decomposed[1]),
            vec!["n2:1".to_string(), "n2:3".to_string()]
        );
        assert_eq!(
            port_names(&decomposed[2]),
            vec!["n3:3".to_string(), "n3:2".to_string()]
        );
    }

    #[tokio::test]
    async fn subrequests_carry_node_driver_hints() {
        let fixture = TopologyFixture::new()
            .node_with_driver("n1", "d1", &["n1:1", "n1:2", "n1:3"])
            .node_with_driver("n2", "d2", &["n2:1", "n2:2", "n2:3"])
            .node_with_driver("n3", "d1", &["n3:1", "n3:2", "n3:3"])
            .link("n1", "n1:1", "n2", "n2:1")
            .link("n2", "n2:3", "n3", "n3:3");
        let decomposer = decomposer(fixture);

        let decomposed = decomposer
            .decompose(&[ep("n1:2"), ep("n3:2")], &Constraints::none())
            .await
            .unwrap();

        let hints: Vec<_> = decomposed
            .iter()
            .map(|s| s.driver_hint.clone().unwrap())
            .collect();
        assert_eq!(
            hints,
            vec![DriverId::new("d1"), DriverId::new("d2"), DriverId::new("d1")]
        );
    }

    #[tokio::test]
    async fn disabling_either_link_breaks_the_route() {
        for disabled in [0, 1] {
            let states = |i: usize| {
                if i == disabled {
                    OperationalState::Disabled
                } else {
                    OperationalState::Enabled
                }
            };
            let fixture = TopologyFixture::new()
                .node("n1", &["n1:1", "n1:2", "n1:3"])
                .node("n2", &["n2:1", "n2:2", "n2:3"])
                .node("n3", &["n3:1", "n3:2", "n3:3"])
                .link_with_state("n1", "n1:1", "n2", "n2:1", states(0))
                .link_with_state("n2", "n2:3", "n3", "n3:3", states(1));
            let decomposer = decomposer(fixture);

            let err = decomposer
                .decompose(&[ep("n1:2"), ep("n3:2")], &Constraints::none())
                .await
                .unwrap_err();
            assert!(matches!(err, DecompositionError::NoPath));
        }
    }

    #[tokio::test]
    async fn hop_constraint_rejects_long_routes() {
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2"])
            .node("n2", &["n2:1", "n2:2", "n2:3"])
            .node("n3", &["n3:2", "n3:3"])
            .link("n1", "n1:1", "n2", "n2:1")
            .link("n2", "n2:3", "n3", "n3:3");
        let decomposer = decomposer(fixture);

        let constrained = Constraints::none().with_max_hops(1);
        let err = decomposer
            .decompose(&[ep("n1:2"), ep("n3:2")], &constrained)
            .await
            .unwrap_err();
        assert!(matches!(err, DecompositionError::NoPath));

        let relaxed = Constraints::none().with_max_hops(2);
        let decomposed = decomposer
            .decompose(&[ep("n1:2"), ep("n3:2")], &relaxed)
            .await
            .unwrap();
        assert_eq!(decomposed.len(), 3);
    }

    #[tokio::test]
    async fn multipoint_request_unions_pairwise_paths() {
        // star: n2 in the middle, endpoints on n1, n3, n4
        let fixture = TopologyFixture::new()
            .node("n1", &["n1:1", "n1:2"])
            .node("n2", &["n2:1", "n2:2", "n2:3"])
            .node("n3", &["n3:1", "n3:2"])
            .node("n4", &["n4:1", "n4:2"])
            .link("n1", "n1:1", "n2", "n2:1")
            .link("n2", "n2:2", "n3", "n3:1")
            .link("n2", "n2:3", "n4", "n4:1");
        let decomposer = decomposer(fixture);

        let decomposed = decomposer
            .decompose(&[ep("n1:2"), ep("n3:2"), ep("n4:2")], &Constraints::none())
            .await
            .unwrap();

        assert_eq!(decomposed.len(), 4);
        let hub = decomposed
            .iter()
            .find(|s| s.node == NodeId::new("n2"))
            .unwrap();
        // the hub interconnects all three link-facing ports, deduplicated
        assert_eq!(
            port_names(hub),
            vec!["n2:1".to_string(), "n2:2".to_string(), "n2:3".to_string()]
        );
    }

    fn port_names(sub: &Subrequest) -> Vec<String> {
        sub.endpoints
            .iter()
            .map(|ep| ep.edge_point.as_ref().unwrap().edge_point.as_str().to_string())
            .collect()
    }
}
