//! Flowgate Pipeline Runtime
//!
//! This crate executes validated pipeline specs. It owns the lifecycle of a
//! pipeline *generation* (the immutable pairing of instantiated filters
//! with a compiled flow), routes each request through the flow's
//! conditional jumps, and swaps generations atomically on hot reload so
//! that no request is ever dropped while a spec changes.
//!
//! # Components
//!
//! - [`Pipeline`]: one generation; builds from a spec (`init`) or from a
//!   spec plus its predecessor (`inherit`), handles requests, aggregates
//!   filter status, closes filters on retirement
//! - [`SharedPipeline`]: the atomic generation pointer; `reload` installs a
//!   successor while in-flight requests finish on the generation they
//!   captured at entry
//! - [`StatusTicker`]: periodic task publishing pipeline status snapshots
//!   on the 5-second cadence the traffic statistics expect

mod pipeline;
mod shared;
mod ticker;

#[cfg(test)]
mod tests_support;

pub use pipeline::{FilterStat, Pipeline, PipelineStatus};
pub use shared::SharedPipeline;
pub use ticker::{StatusTicker, StatusTickerConfig};
