//! Testing utilities for the ECA workspace
//!
//! Shared fixtures: a topology builder DSL, request endpoint shorthand and
//! recording driver mocks with a shared call journal.

#![allow(missing_docs)]

use eca_driver::{ActivationDriver, BuilderContext, DriverBuilder, DriverError};
use eca_model::{EdgePointRef, EndPoint, NodeId, OperationalState, ServiceId};
use eca_topology::{EdgePoint, Link, Node, SharedTopologyService, TopologySnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Initialize tracing for a test binary; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Request endpoint referencing the sip named after a port, mirroring the
/// fixture convention that every port exposes a sip of the same name.
pub fn ep(sip: &str) -> EndPoint {
    EndPoint::new(sip)
}

/// Builder DSL for topology snapshots.
///
/// Every port is exposed as a service interface point of the same name, so
/// `ep("n1:1")` resolves to port `n1:1` on node `n1`.
#[derive(Debug, Default)]
pub struct TopologyFixture {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl TopologyFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node with the given ports, no driver advertisement
    #[must_use]
    pub fn node(mut self, id: &str, ports: &[&str]) -> Self {
        self.nodes.push(Node::new(
            id,
            ports
                .iter()
                .map(|p| EdgePoint::new(*p).with_sip(*p))
                .collect(),
        ));
        self
    }

    /// Node advertising a driver family
    #[must_use]
    pub fn node_with_driver(mut self, id: &str, driver: &str, ports: &[&str]) -> Self {
        self.nodes.push(
            Node::new(
                id,
                ports
                    .iter()
                    .map(|p| EdgePoint::new(*p).with_sip(*p))
                    .collect(),
            )
            .with_driver(driver),
        );
        self
    }

    /// Enabled link between two ports
    #[must_use]
    pub fn link(self, a_node: &str, a_port: &str, b_node: &str, b_port: &str) -> Self {
        self.link_with_state(a_node, a_port, b_node, b_port, OperationalState::Enabled)
    }

    /// Link in an explicit operational state
    #[must_use]
    pub fn link_with_state(
        mut self,
        a_node: &str,
        a_port: &str,
        b_node: &str,
        b_port: &str,
        state: OperationalState,
    ) -> Self {
        self.links.push(Link::new(
            EdgePointRef::new(a_node, a_port),
            EdgePointRef::new(b_node, b_port),
            state,
        ));
        self
    }

    #[must_use]
    pub fn build(self) -> TopologySnapshot {
        TopologySnapshot::new(self.nodes, self.links)
    }

    #[must_use]
    pub fn into_service(self) -> SharedTopologyService {
        SharedTopologyService::new(self.build())
    }
}

/// Driver lifecycle calls a recording driver can log, fail or delay on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    Initialize,
    Activate,
    Deactivate,
    Commit,
    Rollback,
}

impl DriverCall {
    fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

/// Shared, ordered journal of driver calls across a whole test scenario
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// All recorded calls, in order, as `label:call` strings
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Only the calls of the given kind, in order
    #[must_use]
    pub fn calls_named(&self, call: DriverCall) -> Vec<String> {
        let suffix = format!(":{}", call.name());
        self.entries
            .lock()
            .iter()
            .filter(|e| e.ends_with(&suffix))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Activation driver that journals every call and can be told to fail or
/// stall on one of them
pub struct RecordingDriver {
    label: String,
    journal: CallJournal,
    fail_on: Option<DriverCall>,
    delay_on: Option<(DriverCall, Duration)>,
    priority: i32,
}

impl RecordingDriver {
    #[must_use]
    pub fn new(label: impl Into<String>, journal: CallJournal) -> Self {
        Self {
            label: label.into(),
            journal,
            fail_on: None,
            delay_on: None,
            priority: 0,
        }
    }

    /// Fail with a device error when `call` is invoked
    #[must_use]
    pub fn failing_on(mut self, call: DriverCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    /// Sleep before completing `call`, to trip per-call timeouts
    #[must_use]
    pub fn delaying(mut self, call: DriverCall, delay: Duration) -> Self {
        self.delay_on = Some((call, delay));
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    async fn run(&mut self, call: DriverCall) -> Result<(), DriverError> {
        if let Some((delayed, delay)) = self.delay_on {
            if delayed == call {
                tokio::time::sleep(delay).await;
            }
        }
        self.journal.record(format!("{}:{}", self.label, call.name()));
        if self.fail_on == Some(call) {
            return Err(DriverError::Device(format!(
                "{} refused {}",
                self.label,
                call.name()
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ActivationDriver for RecordingDriver {
    async fn initialize(
        &mut self,
        _endpoints: &[EndPoint],
        _service_id: &ServiceId,
    ) -> Result<(), DriverError> {
        self.run(DriverCall::Initialize).await
    }

    async fn activate(&mut self) -> Result<(), DriverError> {
        self.run(DriverCall::Activate).await
    }

    async fn deactivate(&mut self) -> Result<(), DriverError> {
        self.run(DriverCall::Deactivate).await
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.run(DriverCall::Commit).await
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.run(DriverCall::Rollback).await
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Builder that claims every port and port pair, producing recording
/// drivers labelled with the owning node id
pub struct RecordingBuilder {
    id: String,
    journal: CallJournal,
    fail_activate_on: Option<NodeId>,
    delay_on: Option<(DriverCall, Duration)>,
}

impl RecordingBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            journal: CallJournal::new(),
            fail_activate_on: None,
            delay_on: None,
        }
    }

    /// Share a journal across several builders
    #[must_use]
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = journal;
        self
    }

    /// Drivers produced for this node will fail `activate`
    #[must_use]
    pub fn failing_activate_on(mut self, node: impl Into<NodeId>) -> Self {
        self.fail_activate_on = Some(node.into());
        self
    }

    /// Every produced driver sleeps before completing `call`
    #[must_use]
    pub fn delaying(mut self, call: DriverCall, delay: Duration) -> Self {
        self.delay_on = Some((call, delay));
        self
    }

    #[must_use]
    pub fn journal(&self) -> CallJournal {
        self.journal.clone()
    }

    fn driver_for_node(&self, node: &NodeId) -> Box<dyn ActivationDriver> {
        let mut driver = RecordingDriver::new(node.as_str(), self.journal.clone());
        if self.fail_activate_on.as_ref() == Some(node) {
            driver = driver.failing_on(DriverCall::Activate);
        }
        if let Some((call, delay)) = self.delay_on {
            driver = driver.delaying(call, delay);
        }
        Box::new(driver)
    }
}

impl DriverBuilder for RecordingBuilder {
    fn driver_id(&self) -> &str {
        &self.id
    }

    fn driver_for_port(
        &self,
        port: &EdgePointRef,
        _context: &BuilderContext,
    ) -> Option<Box<dyn ActivationDriver>> {
        Some(self.driver_for_node(&port.node))
    }

    fn driver_for_ports(
        &self,
        a: &EdgePointRef,
        _b: &EdgePointRef,
        _context: &BuilderContext,
    ) -> Option<Box<dyn ActivationDriver>> {
        Some(self.driver_for_node(&a.node))
    }
}
