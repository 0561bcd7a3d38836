//! Request adaptor filter.
//!
//! Rewrites the active request before it reaches later stages: sets or
//! removes headers, and optionally replaces the method or path. Combined
//! with a flow node's `requestID`, the rewritten request gets a name that
//! later nodes can return to with `useRequest`.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use flowgate_core::registry::{self, FilterKind};
use flowgate_core::{Context, Filter, FilterSpec, Result};

pub const KIND: &str = "RequestAdaptor";

const RESULTS: &[&str] = &[];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAdaptorConfig {
    /// Headers to set (overwriting existing values).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub set_headers: HashMap<String, String>,

    /// Headers to remove.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_headers: Vec<String>,

    /// Replacement request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Replacement request method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Rewrites the active request.
#[derive(Default)]
pub struct RequestAdaptor {
    config: RequestAdaptorConfig,
}

impl Filter for RequestAdaptor {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn init(&mut self, spec: &FilterSpec) -> Result<()> {
        self.config = spec.config()?;
        Ok(())
    }

    fn handle(&self, ctx: &mut Context) -> String {
        let req = ctx.request_mut();

        for (name, value) in &self.config.set_headers {
            req.headers.insert(name.clone(), value.clone());
        }
        for name in &self.config.remove_headers {
            req.headers.remove(name);
        }
        if let Some(path) = &self.config.path {
            req.path = path.clone();
        }
        if let Some(method) = &self.config.method {
            req.method = method.clone();
        }

        String::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn register() {
    registry::register(FilterKind {
        name: KIND,
        results: RESULTS,
        default_spec: || json!({"kind": KIND}),
        create: || Box::<RequestAdaptor>::default(),
        check_spec: |spec| spec.config::<RequestAdaptorConfig>().map(|_| ()),
    });
}
