//! Core types for the controller
//!
//! Defines the request shapes accepted by the orchestration surface and the
//! controller configuration.

use eca_model::{EndPoint, ServiceId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Maximum connectivity requests processed concurrently
    pub max_concurrent_requests: usize,
    /// Timeout applied to every individual driver call
    pub driver_call_timeout_secs: u64,
    /// Upper bound on endpoints accepted per request
    pub max_endpoints_per_request: usize,
}

impl ControllerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a concurrent-request bound
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// With a per-driver-call timeout
    #[inline]
    #[must_use]
    pub fn with_driver_call_timeout(mut self, secs: u64) -> Self {
        self.driver_call_timeout_secs = secs;
        self
    }

    /// Driver call timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn driver_call_timeout(&self) -> Duration {
        Duration::from_secs(self.driver_call_timeout_secs)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 16,
            driver_call_timeout_secs: 30,
            max_endpoints_per_request: 16,
        }
    }
}

/// Decomposition constraints supplied with a create request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Reject routes longer than this many links
    pub max_hops: Option<usize>,
}

impl Constraints {
    /// No constraints
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// With a hop bound
    #[inline]
    #[must_use]
    pub fn with_max_hops(mut self, hops: usize) -> Self {
        self.max_hops = Some(hops);
        self
    }
}

/// Request to create a connectivity service between named endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Endpoints to interconnect, referenced by service interface point
    pub endpoints: Vec<EndPoint>,
    /// Decomposition constraints
    pub constraints: Constraints,
}

impl CreateRequest {
    /// Request connecting `endpoints`
    #[must_use]
    pub fn new(endpoints: Vec<EndPoint>) -> Self {
        Self {
            endpoints,
            constraints: Constraints::none(),
        }
    }

    /// Point-to-point request between two service interface points
    #[must_use]
    pub fn between(a: impl Into<eca_model::SipId>, b: impl Into<eca_model::SipId>) -> Self {
        Self::new(vec![EndPoint::new(a), EndPoint::new(b)])
    }

    /// With decomposition constraints
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Request to update a single endpoint of an existing service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Service to update
    pub service_id: ServiceId,
    /// Replacement endpoint
    pub endpoint: EndPoint,
}

impl UpdateRequest {
    /// Update `service_id` with `endpoint`
    #[inline]
    #[must_use]
    pub fn new(service_id: ServiceId, endpoint: EndPoint) -> Self {
        Self {
            service_id,
            endpoint,
        }
    }
}
