//! Driver resolution over the registered builder set

use crate::builder::{BuilderContext, DriverBuilder};
use crate::driver::ActivationDriver;
use crate::error::RegistryError;
use eca_model::{EdgePointRef, Subrequest};
use std::sync::Arc;

/// Resolves edge points to exactly one capability-matched driver.
///
/// Backed by a fixed set of builders registered at construction time; the
/// registry itself holds no other state and is safe to share across
/// concurrent requests.
#[derive(Clone)]
pub struct DriverRegistry {
    builders: Vec<Arc<dyn DriverBuilder>>,
}

impl DriverRegistry {
    /// Registry over `builders`
    #[must_use]
    pub fn new(builders: Vec<Arc<dyn DriverBuilder>>) -> Self {
        tracing::debug!(builders = builders.len(), "driver registry initialized");
        Self { builders }
    }

    /// Resolve a driver for a single port
    pub fn resolve(
        &self,
        port: &EdgePointRef,
        context: &BuilderContext,
    ) -> Result<Box<dyn ActivationDriver>, RegistryError> {
        single_match(
            self.builders
                .iter()
                .filter_map(|b| b.driver_for_port(port, context))
                .collect(),
            || port.to_string(),
        )
    }

    /// Resolve a driver interconnecting two ports on the same node
    pub fn resolve_pair(
        &self,
        a: &EdgePointRef,
        b: &EdgePointRef,
        context: &BuilderContext,
    ) -> Result<Box<dyn ActivationDriver>, RegistryError> {
        single_match(
            self.builders
                .iter()
                .filter_map(|builder| builder.driver_for_ports(a, b, context))
                .collect(),
            || format!("{a}, {b}"),
        )
    }

    /// Resolve the driver for one subrequest, dispatching on its arity:
    /// a single resolved edge point uses single-port resolution, two use
    /// the same-node pair form.
    pub fn resolve_subrequest(
        &self,
        subrequest: &Subrequest,
        context: &BuilderContext,
    ) -> Result<Box<dyn ActivationDriver>, RegistryError> {
        let ports: Vec<_> = subrequest
            .endpoints
            .iter()
            .filter_map(|ep| ep.edge_point.as_ref())
            .collect();

        match ports.as_slice() {
            [port] => self.resolve(port, context),
            [a, b, ..] => self.resolve_pair(a, b, context),
            [] => Err(RegistryError::NoEndpoints {
                node: subrequest.node.clone(),
            }),
        }
    }
}

fn single_match(
    mut drivers: Vec<Box<dyn ActivationDriver>>,
    ports: impl Fn() -> String,
) -> Result<Box<dyn ActivationDriver>, RegistryError> {
    match drivers.len() {
        0 => Err(RegistryError::DriverNotFound { ports: ports() }),
        1 => Ok(drivers.remove(0)),
        count => Err(RegistryError::DriverAmbiguous {
            ports: ports(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use eca_model::{EdgePointRef, EndPoint, ServiceId};

    struct NullDriver;

    #[async_trait::async_trait]
    impl ActivationDriver for NullDriver {
        async fn initialize(
            &mut self,
            _endpoints: &[EndPoint],
            _service_id: &ServiceId,
        ) -> Result<(), DriverError> {
            Ok(())
        }

        async fn activate(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        async fn deactivate(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    /// Builder claiming every single port, declining pairs
    struct SinglePortBuilder;

    impl DriverBuilder for SinglePortBuilder {
        fn driver_id(&self) -> &str {
            "single"
        }

        fn driver_for_port(
            &self,
            _port: &EdgePointRef,
            _context: &BuilderContext,
        ) -> Option<Box<dyn ActivationDriver>> {
            Some(Box::new(NullDriver))
        }

        fn driver_for_ports(
            &self,
            _a: &EdgePointRef,
            _b: &EdgePointRef,
            _context: &BuilderContext,
        ) -> Option<Box<dyn ActivationDriver>> {
            None
        }
    }

    /// Builder claiming every pair, declining single ports
    struct PairBuilder;

    impl DriverBuilder for PairBuilder {
        fn driver_id(&self) -> &str {
            "pair"
        }

        fn driver_for_port(
            &self,
            _port: &EdgePointRef,
            _context: &BuilderContext,
        ) -> Option<Box<dyn ActivationDriver>> {
            None
        }

        fn driver_for_ports(
            &self,
            _a: &EdgePointRef,
            _b: &EdgePointRef,
            _context: &BuilderContext,
        ) -> Option<Box<dyn ActivationDriver>> {
            Some(Box::new(NullDriver))
        }
    }

    fn port(node: &str, ep: &str) -> EdgePointRef {
        EdgePointRef::new(node, ep)
    }

    #[test]
    fn empty_builder_list_yields_not_found() {
        let registry = DriverRegistry::new(vec![]);
        let err = registry
            .resolve(&port("n1", "n1:1"), &BuilderContext::new())
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DriverNotFound { .. }));
    }

    #[test]
    fn conflicting_builders_yield_ambiguous() {
        let registry =
            DriverRegistry::new(vec![Arc::new(SinglePortBuilder), Arc::new(SinglePortBuilder)]);
        let err = registry
            .resolve(&port("n1", "n1:1"), &BuilderContext::new())
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DriverAmbiguous { count: 2, .. }));
    }

    #[test]
    fn single_port_resolution() {
        let registry = DriverRegistry::new(vec![Arc::new(SinglePortBuilder), Arc::new(PairBuilder)]);
        assert!(registry
            .resolve(&port("n1", "n1:1"), &BuilderContext::new())
            .is_ok());
    }

    #[test]
    fn dual_port_resolution_picks_pair_builder() {
        let registry = DriverRegistry::new(vec![Arc::new(SinglePortBuilder), Arc::new(PairBuilder)]);
        assert!(registry
            .resolve_pair(&port("n1", "n1:1"), &port("n1", "n1:2"), &BuilderContext::new())
            .is_ok());
    }

    #[test]
    fn subrequest_arity_dispatch() {
        let registry = DriverRegistry::new(vec![Arc::new(PairBuilder)]);
        let sub = Subrequest::new(
            "n1",
            [
                EndPoint::at(port("n1", "n1:1")),
                EndPoint::at(port("n1", "n1:2")),
            ],
        );
        assert!(registry.resolve_subrequest(&sub, &BuilderContext::new()).is_ok());

        let empty = Subrequest::new("n1", []);
        let err = registry
            .resolve_subrequest(&empty, &BuilderContext::new())
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::NoEndpoints { .. }));
    }
}
