//! Request validation
//!
//! Shape checks performed before any graph or driver work. Problems are
//! accumulated rather than failing on the first, so the caller sees every
//! defect of a request at once.

use crate::types::{ControllerConfig, CreateRequest, UpdateRequest};
use std::collections::HashSet;

/// Accumulated validation problems
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    problems: Vec<String>,
}

impl ValidationResult {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem
    #[must_use]
    pub fn problem(mut self, description: impl Into<String>) -> Self {
        self.problems.push(description.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    /// All recorded problems
    #[must_use]
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// Problems joined into one human-readable reason
    #[must_use]
    pub fn summary(&self) -> String {
        self.problems.join("; ")
    }
}

/// Validates incoming connectivity requests against basic shape rules
#[derive(Debug, Default)]
pub struct RequestValidator;

impl RequestValidator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check a create request
    #[must_use]
    pub fn check_create(&self, request: &CreateRequest, config: &ControllerConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if request.endpoints.is_empty() {
            return result.problem("endpoint list is empty");
        }
        if request.endpoints.len() < 2 {
            result = result.problem("at least two endpoints required");
        }
        if request.endpoints.len() > config.max_endpoints_per_request {
            result = result.problem(format!(
                "endpoint count {} exceeds limit {}",
                request.endpoints.len(),
                config.max_endpoints_per_request
            ));
        }

        let mut seen = HashSet::new();
        for ep in &request.endpoints {
            if ep.sip.as_str().is_empty() {
                result = result.problem("endpoint with empty service interface point");
            } else if !seen.insert(&ep.sip) {
                result = result.problem(format!("duplicate service interface point {}", ep.sip));
            }
        }

        result
    }

    /// Check an update request
    #[must_use]
    pub fn check_update(&self, request: &UpdateRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if request.service_id.as_str().is_empty() {
            result = result.problem("service id is empty");
        }
        if request.endpoint.sip.as_str().is_empty() {
            result = result.problem("endpoint with empty service interface point");
        }

        result
    }
}
