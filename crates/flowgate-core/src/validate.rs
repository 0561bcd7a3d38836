//! Static validation of a pipeline spec.
//!
//! Validation is all-or-nothing: the first violation aborts with a single
//! descriptive error and no partial pipeline is ever installed. Two phases:
//!
//! 1. **Filter specs**: names are present, unique and not the built-in
//!    sentinel; kinds resolve in the registry; bodies pass the kind's own
//!    schema check.
//! 2. **Flow graph**: a right-to-left walk over the flow verifies every
//!    `jumpIf` entry against the kind's declared result set and against the
//!    set of targets already seen (seeded with `END`), which enforces
//!    forward-only jumps without building an auxiliary graph; a
//!    left-to-right walk verifies every `useRequest` against the request
//!    identifiers produced so far (seeded with `Default`).

use std::collections::{HashMap, HashSet};

use crate::context::DEFAULT_ID;
use crate::error::{FlowgateError, Result};
use crate::registry;
use crate::spec::{is_builtin_filter, FilterSpec, PipelineSpec, END_FILTER};

impl PipelineSpec {
    /// Validates the whole spec. A spec that passes can always be compiled
    /// and every request through the compiled flow terminates.
    pub fn validate(&self) -> Result<()> {
        let specs = self.validate_filters()?;
        self.validate_flow(&specs)
    }

    fn validate_filters(&self) -> Result<HashMap<String, FilterSpec>> {
        let mut specs = HashMap::new();

        for raw in &self.filters {
            let spec = FilterSpec::new(raw.clone())?;

            let kind = registry::by_kind(spec.kind()).ok_or_else(|| FlowgateError::UnknownKind {
                name: spec.name().to_string(),
                kind: spec.kind().to_string(),
            })?;
            (kind.check_spec)(&spec)?;

            let name = spec.name().to_string();
            if specs.contains_key(&name) {
                return Err(FlowgateError::DuplicateFilterName(name));
            }
            specs.insert(name, spec);
        }

        Ok(specs)
    }

    fn validate_flow(&self, specs: &HashMap<String, FilterSpec>) -> Result<()> {
        // Jump targets must point at later nodes, so walk backwards and
        // only accept targets already seen.
        let mut valid_targets: HashSet<&str> = HashSet::from([END_FILTER]);
        for node in self.flow.iter().rev() {
            if is_builtin_filter(&node.filter) {
                continue;
            }

            let spec = specs
                .get(&node.filter)
                .ok_or_else(|| FlowgateError::UnknownFlowFilter(node.filter.clone()))?;
            // Kind resolution was checked in the filter phase.
            let kind = registry::by_kind(spec.kind()).expect("kind validated");

            for (result, target) in &node.jump_if {
                if !kind.has_result(result) {
                    return Err(FlowgateError::UnknownResult {
                        filter: node.filter.clone(),
                        result: result.clone(),
                        results: kind.results,
                    });
                }
                if !valid_targets.contains(target.as_str()) {
                    return Err(FlowgateError::UnknownJumpTarget {
                        filter: node.filter.clone(),
                        target: target.clone(),
                    });
                }
            }

            valid_targets.insert(node.filter.as_str());
        }

        // Request identifiers must be produced before they are used.
        let mut produced: HashSet<&str> = HashSet::from([DEFAULT_ID]);
        for node in &self.flow {
            if let Some(wanted) = &node.use_request {
                if !produced.contains(wanted.as_str()) {
                    return Err(FlowgateError::UnknownRequest {
                        filter: node.filter.clone(),
                        request: wanted.clone(),
                    });
                }
            }
            if let Some(id) = &node.request_id {
                produced.insert(id.as_str());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::registry::FilterKind;
    use crate::Context;
    use serde_json::json;
    use std::any::Any;
    use std::sync::Once;

    struct Probe;

    impl Filter for Probe {
        fn kind(&self) -> &'static str {
            "ValidateTestProbe"
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

    fn register_probe() {
        static ONCE: Once = Once::new();
        ONCE.call_once(|| {
            registry::register(FilterKind {
                name: "ValidateTestProbe",
                results: &["ok", "fail"],
                default_spec: || json!({"kind": "ValidateTestProbe"}),
                create: || Box::new(Probe),
                check_spec: |spec| {
                    // The probe kind refuses bodies carrying `broken: true`.
                    if spec.raw().get("broken").and_then(serde_json::Value::as_bool) == Some(true) {
                        return Err(FlowgateError::InvalidFilterBody {
                            name: spec.name().to_string(),
                            kind: spec.kind().to_string(),
                            message: "broken".to_string(),
                        });
                    }
                    Ok(())
                },
            });
        });
    }

    fn probe(name: &str) -> serde_json::Value {
        json!({"name": name, "kind": "ValidateTestProbe"})
    }

    #[test]
    fn test_valid_linear_spec() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("b"))
            .with_flow(vec![crate::FlowNode::new("a"), crate::FlowNode::new("b")]);
        spec.validate().unwrap();
    }

    #[test]
    fn test_empty_flow_is_valid() {
        register_probe();
        let spec = PipelineSpec::new("p").with_filter(probe("a"));
        spec.validate().unwrap();
    }

    #[test]
    fn test_duplicate_filter_name() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("a"));
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FlowgateError::DuplicateFilterName(n) if n == "a"));
    }

    #[test]
    fn test_unknown_kind() {
        let spec = PipelineSpec::new("p").with_filter(json!({"name": "a", "kind": "Bogus"}));
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FlowgateError::UnknownKind { kind, .. } if kind == "Bogus"));
    }

    #[test]
    fn test_kind_body_check_is_delegated() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(json!({"name": "a", "kind": "ValidateTestProbe", "broken": true}));
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FlowgateError::InvalidFilterBody { name, .. } if name == "a"));
    }

    #[test]
    fn test_flow_references_unknown_filter() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_flow(vec![crate::FlowNode::new("ghost")]);
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FlowgateError::UnknownFlowFilter(n) if n == "ghost"));
    }

    #[test]
    fn test_backward_jump_is_rejected() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("b"))
            .with_flow(vec![
                crate::FlowNode::new("a"),
                crate::FlowNode::new("b").with_jump("fail", "a"),
            ]);
        let err = spec.validate().unwrap_err();
        match err {
            FlowgateError::UnknownJumpTarget { filter, target } => {
                assert_eq!(filter, "b");
                assert_eq!(target, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_jump_is_rejected() {
        register_probe();
        let spec = PipelineSpec::new("p").with_filter(probe("a")).with_flow(vec![
            crate::FlowNode::new("a").with_jump("fail", "a"),
        ]);
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, FlowgateError::UnknownJumpTarget { .. }));
    }

    #[test]
    fn test_undeclared_result_label_is_rejected() {
        register_probe();
        let spec = PipelineSpec::new("p").with_filter(probe("a")).with_flow(vec![
            crate::FlowNode::new("a").with_jump("timeout", END_FILTER),
        ]);
        let err = spec.validate().unwrap_err();
        match err {
            FlowgateError::UnknownResult { filter, result, .. } => {
                assert_eq!(filter, "a");
                assert_eq!(result, "timeout");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_forward_jump_and_end_target_are_valid() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("b"))
            .with_flow(vec![
                crate::FlowNode::new("a")
                    .with_jump("ok", "b")
                    .with_jump("fail", END_FILTER),
                crate::FlowNode::new("b"),
            ]);
        spec.validate().unwrap();
    }

    #[test]
    fn test_use_request_must_be_produced_earlier() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("b"))
            .with_flow(vec![
                crate::FlowNode::new("a").with_use_request("mirror"),
                crate::FlowNode::new("b").with_request_id("mirror"),
            ]);
        let err = spec.validate().unwrap_err();
        match err {
            FlowgateError::UnknownRequest { filter, request } => {
                assert_eq!(filter, "a");
                assert_eq!(request, "mirror");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Producing first makes the same pair valid.
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("b"))
            .with_flow(vec![
                crate::FlowNode::new("a").with_request_id("mirror"),
                crate::FlowNode::new("b").with_use_request("mirror"),
            ]);
        spec.validate().unwrap();
    }

    #[test]
    fn test_default_request_is_always_available() {
        register_probe();
        let spec = PipelineSpec::new("p").with_filter(probe("a")).with_flow(vec![
            crate::FlowNode::new("a").with_use_request(DEFAULT_ID),
        ]);
        spec.validate().unwrap();
    }

    #[test]
    fn test_validated_spec_survives_yaml_round_trip() {
        register_probe();
        let spec = PipelineSpec::new("p")
            .with_filter(probe("a"))
            .with_filter(probe("b"))
            .with_flow(vec![
                crate::FlowNode::new("a").with_jump("ok", "b"),
                crate::FlowNode::new("b"),
            ]);
        spec.validate().unwrap();

        let round = PipelineSpec::from_yaml(&spec.to_yaml().unwrap()).unwrap();
        round.validate().unwrap();
    }
}
