//! The activation driver capability contract

use crate::error::DriverError;
use eca_model::{EndPoint, ServiceId};

/// A stateful driver that maps connectivity concepts onto the configuration
/// of one network element.
///
/// A driver participates in exactly one transaction:
/// 1. `initialize` binds it to the endpoints and service it will configure;
///    a failure here aborts the transaction before any side effect
/// 2. `activate`, `deactivate` or `update` pushes the candidate
///    configuration
/// 3. `commit` is called when every driver in the transaction succeeded,
///    `rollback` when any of them failed
///
/// How the driver renders vendor CLI or NETCONF payloads is its own
/// business; per-element session setup belongs to the builder that produced
/// it.
#[async_trait::async_trait]
pub trait ActivationDriver: Send {
    /// Bind the driver to the endpoints it must interconnect for `service_id`
    async fn initialize(
        &mut self,
        endpoints: &[EndPoint],
        service_id: &ServiceId,
    ) -> Result<(), DriverError>;

    /// Push the activation configuration
    async fn activate(&mut self) -> Result<(), DriverError>;

    /// Push the deactivation configuration
    async fn deactivate(&mut self) -> Result<(), DriverError>;

    /// Replace the element's configuration for an updated endpoint
    async fn update(&mut self) -> Result<(), DriverError> {
        self.deactivate().await?;
        self.activate().await
    }

    /// Make the pushed configuration durable; called once all drivers in
    /// the transaction succeeded
    async fn commit(&mut self) -> Result<(), DriverError>;

    /// Undo the pushed configuration; called when another driver in the
    /// transaction failed
    async fn rollback(&mut self) -> Result<(), DriverError>;

    /// Influences the order in which drivers run within a transaction.
    ///
    /// Drivers sharing the default keep decomposition (path) order.
    fn priority(&self) -> i32 {
        0
    }
}
