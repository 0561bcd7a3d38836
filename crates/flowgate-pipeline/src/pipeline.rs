//! One pipeline generation: instantiated filters plus the compiled flow.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use serde::Serialize;

use flowgate_core::registry;
use flowgate_core::spec::is_builtin_filter;
use flowgate_core::{Context, Filter, FilterSpec, FlowNode, FlowgateError, PipelineSpec, Result};

/// Execution record of one filter invocation.
#[derive(Debug, Clone)]
pub struct FilterStat {
    pub name: String,
    pub kind: &'static str,
    pub result: String,
    pub duration: Duration,
}

/// Aggregated status of a generation, keyed by filter name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStatus {
    pub filters: HashMap<String, serde_json::Value>,
}

fn serialize_stats(stats: &[FilterStat]) -> String {
    if stats.is_empty() {
        return "pipeline: <empty>".to_string();
    }

    let mut out = String::from("pipeline: ");
    for (i, stat) in stats.iter().enumerate() {
        if i > 0 {
            out.push_str("->");
        }
        out.push_str(&stat.name);
        out.push('(');
        if !stat.result.is_empty() {
            out.push_str(&stat.result);
            out.push(',');
        }
        let _ = write!(out, "{:?}", stat.duration);
        out.push(')');
    }
    out
}

/// An immutable pipeline generation.
///
/// Built once by [`Pipeline::init`] or [`Pipeline::inherit`]; after
/// construction neither the filter set nor the flow ever changes. Hot
/// reload replaces the whole generation (see
/// [`SharedPipeline`](crate::SharedPipeline)).
pub struct Pipeline {
    name: String,
    spec: PipelineSpec,
    filters: HashMap<String, Box<dyn Filter>>,
    flow: Vec<FlowNode>,
}

impl Pipeline {
    /// Builds the first generation from a spec.
    pub fn init(spec: PipelineSpec) -> Result<Self> {
        Self::build(spec, None)
    }

    /// Builds a successor generation.
    ///
    /// Filters whose name also exists in `previous` are constructed through
    /// their `inherit` hook so they can take over internal state; the
    /// previous generation's filters whose names are gone are closed here,
    /// exactly once. The previous generation must serve no new request once
    /// this returns.
    pub fn inherit(spec: PipelineSpec, previous: &Pipeline) -> Result<Self> {
        Self::build(spec, Some(previous))
    }

    fn build(spec: PipelineSpec, previous: Option<&Pipeline>) -> Result<Self> {
        spec.validate()?;

        let name = spec.name.clone();
        let mut filters: HashMap<String, Box<dyn Filter>> = HashMap::new();
        let mut specs: Vec<FilterSpec> = Vec::with_capacity(spec.filters.len());

        for raw in &spec.filters {
            let mut fspec = FilterSpec::new(raw.clone())?;
            fspec.set_pipeline(&name);

            let kind =
                registry::by_kind(fspec.kind()).ok_or_else(|| FlowgateError::UnknownKind {
                    name: fspec.name().to_string(),
                    kind: fspec.kind().to_string(),
                })?;

            let mut filter = (kind.create)();
            match previous.and_then(|p| p.filters.get(fspec.name())) {
                Some(prev) => filter.inherit(&fspec, prev.as_ref())?,
                None => filter.init(&fspec)?,
            }

            filters.insert(fspec.name().to_string(), filter);
            specs.push(fspec);
        }

        // Hand-off is complete; retire what the new spec no longer names.
        if let Some(previous) = previous {
            for (prev_name, prev_filter) in &previous.filters {
                if !filters.contains_key(prev_name) {
                    tracing::info!(pipeline = %name, filter = %prev_name, "closing dropped filter");
                    prev_filter.close();
                }
            }
        }

        // A spec without a flow runs its filters in declaration order.
        let flow = if spec.flow.is_empty() {
            specs.iter().map(|s| FlowNode::new(s.name())).collect()
        } else {
            spec.flow.clone()
        };

        tracing::info!(
            pipeline = %name,
            filters = filters.len(),
            nodes = flow.len(),
            "pipeline generation built"
        );

        Ok(Self {
            name,
            spec,
            filters,
            flow,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Looks up a filter of this generation by name.
    pub fn filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|f| f.as_ref())
    }

    /// Runs one request through the flow.
    ///
    /// Filters execute in flow order; a filter's non-empty result label is
    /// looked up in its node's `jumpIf` table, and a hit fast-forwards the
    /// walk to the named node (or terminates on `END`). A label with no
    /// `jumpIf` entry simply falls through to the next node. The serialized
    /// execution trace is attached to the context as a tag, and the label
    /// of the last executed filter is returned (`""` if none ran).
    pub fn handle(&self, ctx: &mut Context) -> String {
        let mut result = String::new();
        let mut next = String::new();
        let mut stats: Vec<FilterStat> = Vec::with_capacity(self.flow.len());

        for node in &self.flow {
            if !next.is_empty() && node.filter != next {
                continue;
            }

            if is_builtin_filter(&node.filter) {
                break;
            }

            let Some(filter) = self.filters.get(&node.filter) else {
                continue;
            };

            if let Some(id) = &node.use_request {
                ctx.use_request(id);
            }
            if let Some(id) = &node.request_id {
                ctx.label_request(id);
            }
            if let Some(id) = &node.response_id {
                ctx.label_response(id);
            }

            let start = Instant::now();
            result = filter.handle(ctx);
            stats.push(FilterStat {
                name: node.filter.clone(),
                kind: filter.kind(),
                result: result.clone(),
                duration: start.elapsed(),
            });

            if !result.is_empty() {
                next = node.jump_if.get(&result).cloned().unwrap_or_default();
            }
            if is_builtin_filter(&next) {
                break;
            }
        }

        ctx.add_tag(serialize_stats(&stats));
        result
    }

    /// Status of every filter in this generation, keyed by name.
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            filters: self
                .filters
                .iter()
                .map(|(name, filter)| (name.clone(), filter.status()))
                .collect(),
        }
    }

    /// Closes every filter of this generation. Only for generations that
    /// were not handed off to a successor.
    pub fn close(&self) {
        for (name, filter) in &self.filters {
            tracing::debug!(pipeline = %self.name, filter = %name, "closing filter");
            filter.close();
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("nodes", &self.flow.len())
            .finish()
    }
}
