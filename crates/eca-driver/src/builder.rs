//! Driver builders and the shared resolution context

use crate::driver::ActivationDriver;
use dashmap::DashMap;
use eca_model::EdgePointRef;
use serde_json::Value;

/// Context key under which the orchestration layer publishes the
/// subrequest's driver hint before resolution
pub const DRIVER_HINT_KEY: &str = "driver-hint";

/// A factory owning one vendor/model integration.
///
/// Registered once at startup. For every subrequest the registry asks each
/// builder whether it claims the port (or same-node port pair); a builder
/// declines by returning `None`. One-time session or credential setup for
/// the target element is a builder concern and must be idempotent; the
/// registry never caches on its behalf.
pub trait DriverBuilder: Send + Sync {
    /// Identifier of the driver family this builder produces
    fn driver_id(&self) -> &str;

    /// Driver for a single port, or `None` if this builder does not claim it
    fn driver_for_port(
        &self,
        port: &EdgePointRef,
        context: &BuilderContext,
    ) -> Option<Box<dyn ActivationDriver>>;

    /// Driver interconnecting two ports on the same node, or `None` if this
    /// builder does not claim the pair
    fn driver_for_ports(
        &self,
        a: &EdgePointRef,
        b: &EdgePointRef,
        context: &BuilderContext,
    ) -> Option<Box<dyn ActivationDriver>>;
}

/// Blackboard passed between builders taking part in one request.
///
/// Carries untyped values keyed by string, so builders can hand each other
/// context (session handles, the decomposer's driver hint) without the
/// registry knowing the shapes involved.
#[derive(Debug, Default)]
pub struct BuilderContext {
    values: DashMap<String, Value>,
}

impl BuilderContext {
    /// Empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.clone())
    }

    /// Put a value, replacing any previous one under `key`
    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Remove a value
    pub fn remove(&self, key: &str) {
        self.values.remove(key);
    }

    /// All keys currently on the blackboard
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.values.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_put_get_remove() {
        let ctx = BuilderContext::new();
        ctx.put(DRIVER_HINT_KEY, json!("d1"));

        assert_eq!(ctx.get(DRIVER_HINT_KEY), Some(json!("d1")));
        assert_eq!(ctx.keys(), vec![DRIVER_HINT_KEY.to_string()]);

        ctx.remove(DRIVER_HINT_KEY);
        assert_eq!(ctx.get(DRIVER_HINT_KEY), None);
    }

    #[test]
    fn context_replaces_existing_value() {
        let ctx = BuilderContext::new();
        ctx.put("k", json!(1));
        ctx.put("k", json!(2));
        assert_eq!(ctx.get("k"), Some(json!(2)));
    }
}
