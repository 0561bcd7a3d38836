//! Atomic generation pointer for hot reload.

use std::sync::Arc;

use arc_swap::ArcSwap;

use flowgate_core::{Context, PipelineSpec, Result};

use crate::pipeline::{Pipeline, PipelineStatus};

/// A pipeline handle that survives spec changes.
///
/// Requests capture the current generation with one atomic load at entry
/// and run it to completion; [`SharedPipeline::reload`] builds the
/// successor generation off to the side and installs it with an atomic
/// pointer swap, so in-flight requests finish on the generation they
/// started on and new requests immediately see the new one. A failed
/// reload leaves the current generation untouched.
pub struct SharedPipeline {
    inner: ArcSwap<Pipeline>,
}

impl SharedPipeline {
    /// Builds the first generation from a spec.
    pub fn new(spec: PipelineSpec) -> Result<Self> {
        Ok(Self {
            inner: ArcSwap::from_pointee(Pipeline::init(spec)?),
        })
    }

    /// The live generation.
    pub fn current(&self) -> Arc<Pipeline> {
        self.inner.load_full()
    }

    /// Handles one request on the generation live at entry.
    pub fn handle(&self, ctx: &mut Context) -> String {
        self.current().handle(ctx)
    }

    /// Validates `spec`, builds a successor generation inheriting from the
    /// live one, and swaps it in.
    pub fn reload(&self, spec: PipelineSpec) -> Result<()> {
        let previous = self.inner.load_full();
        let next = Pipeline::inherit(spec, &previous)?;
        tracing::info!(pipeline = %next.name(), "pipeline reloaded");
        self.inner.store(Arc::new(next));
        Ok(())
    }

    /// Status of the live generation.
    pub fn status(&self) -> PipelineStatus {
        self.current().status()
    }

    /// Closes the live generation's filters. Call once, at shutdown.
    pub fn close(&self) {
        self.current().close();
    }
}

impl std::fmt::Debug for SharedPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPipeline")
            .field("current", &self.current())
            .finish()
    }
}
