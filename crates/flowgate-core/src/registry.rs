//! Process-wide catalog of filter kinds.
//!
//! Kinds are registered once during process start-up and the registry is
//! read-only afterwards; registering the same kind name twice is a
//! programming error and panics. Queries are concurrency-safe.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::error::Result;
use crate::filter::Filter;
use crate::spec::FilterSpec;

/// Static descriptor of a filter kind.
///
/// The factory function stands in for the reflective prototype clone of
/// dynamic runtimes: given a kind name, the runtime asks the descriptor for
/// a fresh zero-valued instance and configures it through the [`Filter`]
/// lifecycle.
#[derive(Clone, Copy)]
pub struct FilterKind {
    /// Registered kind name, e.g. `"RateLimiter"`.
    pub name: &'static str,
    /// Every result label instances of this kind may return from `handle`.
    pub results: &'static [&'static str],
    /// Default kind-specific spec body.
    pub default_spec: fn() -> serde_json::Value,
    /// Produces a fresh, unconfigured instance.
    pub create: fn() -> Box<dyn Filter>,
    /// Checks a spec body against the kind's schema.
    pub check_spec: fn(&FilterSpec) -> Result<()>,
}

impl FilterKind {
    pub fn has_result(&self, result: &str) -> bool {
        self.results.contains(&result)
    }
}

impl std::fmt::Debug for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterKind")
            .field("name", &self.name)
            .field("results", &self.results)
            .finish()
    }
}

fn registry() -> &'static RwLock<HashMap<&'static str, FilterKind>> {
    static REGISTRY: OnceLock<RwLock<HashMap<&'static str, FilterKind>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a filter kind.
///
/// # Panics
///
/// Panics if a kind with the same name is already registered; registration
/// belongs in process start-up code, never on the request path.
pub fn register(kind: FilterKind) {
    let mut kinds = registry().write().unwrap();
    if kinds.contains_key(kind.name) {
        panic!("filter kind {} registered twice", kind.name);
    }
    tracing::debug!(kind = kind.name, "filter kind registered");
    kinds.insert(kind.name, kind);
}

/// Looks a kind up by name.
pub fn by_kind(name: &str) -> Option<FilterKind> {
    registry().read().unwrap().get(name).copied()
}

/// Names of all registered kinds, sorted.
pub fn kinds() -> Vec<&'static str> {
    let mut names: Vec<_> = registry().read().unwrap().keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use std::any::Any;
    use std::sync::Once;

    struct Noop;

    impl Filter for Noop {
        fn kind(&self) -> &'static str {
            "RegistryTestNoop"
        }
        fn init(&mut self, _spec: &FilterSpec) -> Result<()> {
            Ok(())
        }
        fn handle(&self, _ctx: &mut Context) -> String {
            String::new()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn register_noop() {
        static ONCE: Once = Once::new();
        ONCE.call_once(|| {
            register(FilterKind {
                name: "RegistryTestNoop",
                results: &["done"],
                default_spec: || serde_json::json!({"kind": "RegistryTestNoop"}),
                create: || Box::new(Noop),
                check_spec: |_| Ok(()),
            });
        });
    }

    #[test]
    fn test_register_and_query() {
        register_noop();

        let kind = by_kind("RegistryTestNoop").unwrap();
        assert_eq!(kind.name, "RegistryTestNoop");
        assert!(kind.has_result("done"));
        assert!(!kind.has_result("failed"));
        assert!(kinds().contains(&"RegistryTestNoop"));
    }

    #[test]
    fn test_unknown_kind_is_none() {
        assert!(by_kind("NoSuchKind").is_none());
    }

    #[test]
    fn test_factory_produces_instances() {
        register_noop();

        let kind = by_kind("RegistryTestNoop").unwrap();
        let instance = (kind.create)();
        assert_eq!(instance.kind(), "RegistryTestNoop");
        assert_eq!((kind.default_spec)()["kind"], "RegistryTestNoop");
    }
}
