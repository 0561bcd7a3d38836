//! Stub filter shared by the runtime unit tests.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Once};

use serde::Deserialize;
use serde_json::json;

use flowgate_core::registry::{self, FilterKind};
use flowgate_core::{Context, Filter, FilterSpec, FlowNode, PipelineSpec, Result};

use crate::Pipeline;

/// A filter that counts its invocations and returns a configured label.
pub(crate) struct Labeler {
    label: String,
    pub(crate) hits: Arc<AtomicU64>,
    pub(crate) closed: Arc<AtomicBool>,
}

#[derive(Deserialize)]
struct LabelerConfig {
    #[serde(default)]
    label: String,
}

impl Labeler {
    fn new() -> Self {
        Self {
            label: String::new(),
            hits: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Filter for Labeler {
    fn kind(&self) -> &'static str {
        "Labeler"
    }

    fn init(&mut self, spec: &FilterSpec) -> Result<()> {
        let config: LabelerConfig = spec.config()?;
        self.label = config.label;
        Ok(())
    }

    fn inherit(&mut self, spec: &FilterSpec, prev: &dyn Filter) -> Result<()> {
        self.init(spec)?;
        if let Some(prev) = prev.as_any().downcast_ref::<Labeler>() {
            self.hits = Arc::clone(&prev.hits);
        }
        Ok(())
    }

    fn handle(&self, _ctx: &mut Context) -> String {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.label.clone()
    }

    fn status(&self) -> serde_json::Value {
        json!({"hits": self.hits.load(Ordering::Relaxed)})
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn register_labeler() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        registry::register(FilterKind {
            name: "Labeler",
            results: &["deny", "allow", "skip", "done"],
            default_spec: || json!({"kind": "Labeler", "label": ""}),
            create: || Box::new(Labeler::new()),
            check_spec: |spec| spec.config::<LabelerConfig>().map(|_| ()),
        });
    });
}

pub(crate) fn labeler(name: &str, label: &str) -> serde_json::Value {
    json!({"name": name, "kind": "Labeler", "label": label})
}

pub(crate) fn spec_with(filters: Vec<serde_json::Value>, flow: Vec<FlowNode>) -> PipelineSpec {
    let mut spec = PipelineSpec::new("test").with_flow(flow);
    for filter in filters {
        spec = spec.with_filter(filter);
    }
    spec
}

pub(crate) fn hits(pipeline: &Pipeline, name: &str) -> u64 {
    pipeline
        .filter(name)
        .and_then(|f| f.as_any().downcast_ref::<Labeler>())
        .map(|l| l.hits.load(Ordering::Relaxed))
        .unwrap_or_else(|| panic!("no Labeler named {name}"))
}

pub(crate) fn closed_flag(pipeline: &Pipeline, name: &str) -> Arc<AtomicBool> {
    pipeline
        .filter(name)
        .and_then(|f| f.as_any().downcast_ref::<Labeler>())
        .map(|l| Arc::clone(&l.closed))
        .unwrap_or_else(|| panic!("no Labeler named {name}"))
}
