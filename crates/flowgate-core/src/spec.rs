//! Declarative pipeline specification.
//!
//! This is the operator-facing shape of a pipeline: an ordered `flow` of
//! nodes with conditional jumps, plus the `filters` the nodes refer to.
//! Kind-specific filter bodies stay dynamic here; each kind decodes its own
//! body through [`FilterSpec::config`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FlowgateError, Result};

/// Name of the built-in terminal flow node and jump target.
pub const END_FILTER: &str = "END";

/// Whether `name` is the built-in terminal sentinel rather than a filter.
pub fn is_builtin_filter(name: &str) -> bool {
    name == END_FILTER
}

/// One node of the pipeline flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowNode {
    /// Filter name, or [`END_FILTER`] for the terminal node.
    pub filter: String,

    /// Labels the request this node's filter produces.
    #[serde(rename = "requestID", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Labels the response this node's filter produces.
    #[serde(rename = "responseID", default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,

    /// Feeds this node's filter a previously produced request.
    #[serde(rename = "useRequest", default, skip_serializing_if = "Option::is_none")]
    pub use_request: Option<String>,

    /// Maps result labels to the name of a later node, or [`END_FILTER`].
    #[serde(rename = "jumpIf", default, skip_serializing_if = "HashMap::is_empty")]
    pub jump_if: HashMap<String, String>,
}

impl FlowNode {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            request_id: None,
            response_id: None,
            use_request: None,
            jump_if: HashMap::new(),
        }
    }

    pub fn with_jump(mut self, result: impl Into<String>, target: impl Into<String>) -> Self {
        self.jump_if.insert(result.into(), target.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_response_id(mut self, id: impl Into<String>) -> Self {
        self.response_id = Some(id.into());
        self
    }

    pub fn with_use_request(mut self, id: impl Into<String>) -> Self {
        self.use_request = Some(id.into());
        self
    }
}

fn pipeline_kind() -> String {
    "Pipeline".to_string()
}

/// A full pipeline declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Object kind; always `"Pipeline"`.
    #[serde(default = "pipeline_kind")]
    pub kind: String,

    /// Pipeline name.
    #[serde(default)]
    pub name: String,

    /// Execution order with jumps. May be empty, in which case the runtime
    /// synthesizes a jump-free flow in filter declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow: Vec<FlowNode>,

    /// Filter declarations: each entry is a map carrying `name`, `kind` and
    /// the kind-specific body.
    pub filters: Vec<serde_json::Value>,
}

impl PipelineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: pipeline_kind(),
            name: name.into(),
            flow: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn with_flow(mut self, flow: Vec<FlowNode>) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_filter(mut self, filter: serde_json::Value) -> Self {
        self.filters.push(filter);
        self
    }

    /// Parses a spec from its YAML form. Parsing alone accepts any
    /// well-formed document; call [`PipelineSpec::validate`] before
    /// instantiating anything from it.
    pub fn from_yaml(doc: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(doc)?)
    }

    /// Serializes the spec back to YAML. Canonical with respect to
    /// validation: a spec that validates still validates after a
    /// `to_yaml`/`from_yaml` round trip.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// The validated configuration record of one filter instance.
///
/// Immutable after construction; the sole input to a filter's `init` and
/// `inherit`.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    name: String,
    kind: String,
    pipeline: String,
    raw: serde_json::Value,
}

impl FilterSpec {
    /// Builds a `FilterSpec` from one entry of [`PipelineSpec::filters`].
    ///
    /// The entry must be a map with non-empty string `name` and `kind`
    /// fields; the name must not shadow the built-in [`END_FILTER`].
    pub fn new(raw: serde_json::Value) -> Result<Self> {
        let name = raw
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(FlowgateError::MissingFilterName);
        }
        if is_builtin_filter(&name) {
            return Err(FlowgateError::ReservedFilterName(name));
        }

        let kind = raw
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        if kind.is_empty() {
            return Err(FlowgateError::MissingKind(name));
        }

        Ok(Self {
            name,
            kind,
            pipeline: String::new(),
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Name of the owning pipeline; set by the runtime before `init`.
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn set_pipeline(&mut self, pipeline: impl Into<String>) {
        self.pipeline = pipeline.into();
    }

    /// Decodes the kind-specific body into a typed config. Unknown fields
    /// (including the `name`/`kind` envelope) are ignored.
    pub fn config<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.raw.clone()).map_err(|e| FlowgateError::InvalidFilterBody {
            name: self.name.clone(),
            kind: self.kind.clone(),
            message: e.to_string(),
        })
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}
