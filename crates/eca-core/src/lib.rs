//! ECA Core - the connectivity activation pipeline
//!
//! The controller that turns a logical connectivity request into per-element
//! configuration:
//! - [`RequestDecomposer`]: walks the topology graph and splits a request
//!   into per-node subrequests
//! - [`ActivationTransaction`]: runs all resolved drivers as one logical
//!   transaction, commit-all or rollback-on-failure
//! - [`ConnectivityController`]: the orchestration surface
//!   (create / update / delete / get / list) wiring decomposer, driver
//!   registry, transaction and persistence together
//!
//! # Example
//!
//! ```rust,ignore
//! use eca_core::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = ConnectivityController::new(
//!     ControllerConfig::new(),
//!     topology,
//!     registry,
//!     store,
//! );
//!
//! let request = CreateRequest::between("sip:n1:2", "sip:n3:2");
//! let service = controller.create_connectivity_service(request).await?;
//! println!("activated {}", service.id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod connectivity;
pub mod decomposer;
pub mod error;
pub mod store;
pub mod transaction;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use connectivity::ConnectivityController;
pub use decomposer::RequestDecomposer;
pub use error::{DecompositionError, ServiceError, TransactionError};
pub use store::{ConnectionRecord, InMemoryServiceStore, ServiceRecord, ServiceStore, StoreError};
pub use transaction::{ActivationTransaction, CancellationFlag, TransactionResult, TransactionState};
pub use types::{Constraints, ControllerConfig, CreateRequest, UpdateRequest};
pub use validator::{RequestValidator, ValidationResult};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the activation pipeline
    pub use crate::{
        ActivationTransaction, ConnectivityController, ControllerConfig, CreateRequest,
        RequestDecomposer, ServiceError, ServiceStore, TransactionResult, UpdateRequest,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
