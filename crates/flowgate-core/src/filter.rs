//! The contract every pipeline stage implements.

use std::any::Any;

use crate::context::Context;
use crate::error::Result;
use crate::spec::FilterSpec;

/// A single stage in a pipeline.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// request thread of its generation. Mutable per-request state belongs on
/// the [`Context`], long-lived state behind the instance's own
/// synchronization (atomics, `Mutex`-guarded buckets, ...).
///
/// # Lifecycle
///
/// A filter is created by its kind's factory, then receives exactly one of
/// `init` (fresh start) or `inherit` (hot reload with a same-named
/// predecessor), serves `handle` calls for the life of its generation, and
/// is `close`d unless a successor inherited from it.
///
/// # Result labels
///
/// `handle` returns a result label out of the kind's declared result set,
/// or the empty string for the default outcome. The engine treats labels as
/// opaque routing keys against the flow node's `jumpIf` table.
pub trait Filter: Send + Sync {
    /// The registered kind name of this filter.
    fn kind(&self) -> &'static str;

    /// Initializes a fresh instance from its validated spec.
    fn init(&mut self, spec: &FilterSpec) -> Result<()>;

    /// Initializes this instance as the successor of `prev`, a same-named
    /// filter from the previous generation.
    ///
    /// State migration is entirely the filter's business: implementations
    /// typically downcast `prev` via [`Filter::as_any`] and clone the
    /// `Arc`-shared pieces they want to carry over. The caller guarantees
    /// no method is invoked on `prev` after this returns.
    ///
    /// The default implementation starts fresh, which is correct for
    /// stateless kinds.
    fn inherit(&mut self, spec: &FilterSpec, prev: &dyn Filter) -> Result<()> {
        let _ = prev;
        self.init(spec)
    }

    /// Handles one request, returning a result label or `""`.
    fn handle(&self, ctx: &mut Context) -> String;

    /// Exported status of this instance, aggregated by the pipeline.
    fn status(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Releases resources. Not called when a successor inherited from this
    /// instance.
    fn close(&self) {}

    /// Downcast seam for [`Filter::inherit`].
    fn as_any(&self) -> &dyn Any;
}
