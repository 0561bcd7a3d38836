//! Header validation filter.
//!
//! Checks that the active request carries the configured headers, with an
//! optional exact value per header. A failing request gets a `400 Bad
//! Request` response and the `invalid` result label.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use flowgate_core::registry::{self, FilterKind};
use flowgate_core::{Context, Filter, FilterSpec, Result};

pub const KIND: &str = "HeaderValidator";

/// Result label emitted when validation fails.
pub const RESULT_INVALID: &str = "invalid";

const RESULTS: &[&str] = &[RESULT_INVALID];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderRule {
    /// Header name that must be present.
    pub name: String,

    /// Exact value required; any value is accepted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderValidatorConfig {
    #[serde(default)]
    pub headers: Vec<HeaderRule>,
}

/// Validates request headers against configured rules.
pub struct HeaderValidator {
    config: HeaderValidatorConfig,
    valid: Arc<AtomicU64>,
    invalid: Arc<AtomicU64>,
}

impl HeaderValidator {
    fn new() -> Self {
        Self {
            config: HeaderValidatorConfig::default(),
            valid: Arc::new(AtomicU64::new(0)),
            invalid: Arc::new(AtomicU64::new(0)),
        }
    }

    fn violation(&self, ctx: &Context) -> Option<String> {
        for rule in &self.config.headers {
            match ctx.request().header(&rule.name) {
                None => return Some(format!("header {} is missing", rule.name)),
                Some(actual) => {
                    if let Some(expected) = &rule.value {
                        if actual != expected {
                            return Some(format!("header {} has unexpected value", rule.name));
                        }
                    }
                }
            }
        }
        None
    }
}

impl Filter for HeaderValidator {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn init(&mut self, spec: &FilterSpec) -> Result<()> {
        self.config = spec.config()?;
        Ok(())
    }

    fn inherit(&mut self, spec: &FilterSpec, prev: &dyn Filter) -> Result<()> {
        self.config = spec.config()?;
        if let Some(prev) = prev.as_any().downcast_ref::<HeaderValidator>() {
            self.valid = Arc::clone(&prev.valid);
            self.invalid = Arc::clone(&prev.invalid);
        }
        Ok(())
    }

    fn handle(&self, ctx: &mut Context) -> String {
        match self.violation(ctx) {
            None => {
                self.valid.fetch_add(1, Ordering::Relaxed);
                String::new()
            }
            Some(reason) => {
                self.invalid.fetch_add(1, Ordering::Relaxed);
                debug!(path = %ctx.request().path, %reason, "request rejected");

                let resp = ctx.response_mut();
                resp.status_code = 400;
                resp.body = reason.into_bytes();

                RESULT_INVALID.to_string()
            }
        }
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "valid": self.valid.load(Ordering::Relaxed),
            "invalid": self.invalid.load(Ordering::Relaxed),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn register() {
    registry::register(FilterKind {
        name: KIND,
        results: RESULTS,
        default_spec: || json!({"kind": KIND, "headers": []}),
        create: || Box::new(HeaderValidator::new()),
        check_spec: |spec| spec.config::<HeaderValidatorConfig>().map(|_| ()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_core::HttpRequest;
    use serde_json::json;

    fn validator(rules: serde_json::Value) -> HeaderValidator {
        let mut validator = HeaderValidator::new();
        validator
            .init(
                &FilterSpec::new(json!({
                    "name": "guard",
                    "kind": "HeaderValidator",
                    "headers": rules,
                }))
                .unwrap(),
            )
            .unwrap();
        validator
    }

    #[test]
    fn test_accepts_matching_request() {
        let validator = validator(json!([
            {"name": "X-Api-Key"},
            {"name": "X-Tenant", "value": "acme"},
        ]));

        let mut ctx = Context::new(
            HttpRequest::new("GET", "/")
                .with_header("X-Api-Key", "k-123")
                .with_header("X-Tenant", "acme"),
        );
        assert_eq!(validator.handle(&mut ctx), "");
        assert_eq!(ctx.response().status_code, 200);
    }

    #[test]
    fn test_rejects_missing_header() {
        let validator = validator(json!([{"name": "X-Api-Key"}]));

        let mut ctx = Context::new(HttpRequest::new("GET", "/"));
        assert_eq!(validator.handle(&mut ctx), RESULT_INVALID);
        assert_eq!(ctx.response().status_code, 400);
    }

    #[test]
    fn test_rejects_wrong_value() {
        let validator = validator(json!([{"name": "X-Tenant", "value": "acme"}]));

        let mut ctx =
            Context::new(HttpRequest::new("GET", "/").with_header("X-Tenant", "other"));
        assert_eq!(validator.handle(&mut ctx), RESULT_INVALID);
    }

    #[test]
    fn test_status_counts_both_outcomes() {
        let validator = validator(json!([{"name": "X-Api-Key"}]));

        validator.handle(&mut Context::new(
            HttpRequest::new("GET", "/").with_header("X-Api-Key", "k"),
        ));
        validator.handle(&mut Context::new(HttpRequest::new("GET", "/")));

        let status = validator.status();
        assert_eq!(status["valid"], json!(1));
        assert_eq!(status["invalid"], json!(1));
    }

    #[test]
    fn test_empty_rule_set_accepts_everything() {
        let validator = validator(json!([]));
        let mut ctx = Context::new(HttpRequest::new("GET", "/"));
        assert_eq!(validator.handle(&mut ctx), "");
    }
}
