//! ECA Driver - the per-element configuration surface
//!
//! Everything vendor-specific hides behind two traits:
//! - [`ActivationDriver`]: a stateful capability object bound to one
//!   subrequest for the lifetime of one transaction
//!   (initialize → activate/deactivate → commit, or rollback)
//! - [`DriverBuilder`]: a factory that claims a port or port pair and
//!   produces a driver, or declines
//!
//! [`DriverRegistry`] resolves a subrequest's edge points to exactly one
//! driver; zero claimants and multiple claimants are both hard failures,
//! never tie-broken.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod builder;
mod driver;
mod error;
mod registry;

// Re-exports
pub use builder::{BuilderContext, DriverBuilder, DRIVER_HINT_KEY};
pub use driver::ActivationDriver;
pub use error::{DriverError, RegistryError};
pub use registry::DriverRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
