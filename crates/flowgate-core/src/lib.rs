//! Flowgate Core Types and Contracts
//!
//! This crate provides the building blocks shared by every part of the
//! Flowgate traffic gateway: the filter contract, the process-wide kind
//! registry, the declarative pipeline spec and its static validation, and
//! the per-request context that filters operate on.
//!
//! # Overview
//!
//! A Flowgate pipeline is an ordered, conditionally-jumping composition of
//! *filters*. Operators declare pipelines in YAML; the engine validates the
//! declaration against the registered filter kinds before a single filter
//! is instantiated. This crate contains everything needed up to that point:
//!
//! - **Filter contract**: the [`Filter`] trait every stage implements
//! - **Registry**: process-wide catalog mapping kind names to [`FilterKind`]
//!   descriptors (result labels, factory, default spec, body check)
//! - **Spec layer**: [`PipelineSpec`], [`FlowNode`] and [`FilterSpec`] plus
//!   all-or-nothing validation of jump targets and request identifiers
//! - **Context**: the mutable per-request state threaded through the flow
//!
//! # Example
//!
//! ```no_run
//! use flowgate_core::spec::PipelineSpec;
//!
//! let spec = PipelineSpec::from_yaml(r#"
//! kind: Pipeline
//! name: demo
//! flow:
//!   - filter: limiter
//!     jumpIf: { rateLimited: END }
//!   - filter: backend
//! filters:
//!   - name: limiter
//!     kind: RateLimiter
//!     requestsPerSecond: 100
//!   - name: backend
//!     kind: Mock
//!     code: 200
//! "#).unwrap();
//!
//! spec.validate().unwrap();
//! ```

pub mod context;
pub mod error;
pub mod filter;
pub mod registry;
pub mod spec;
mod validate;

pub use context::{Context, HttpRequest, HttpResponse, DEFAULT_ID};
pub use error::{FlowgateError, Result};
pub use filter::Filter;
pub use registry::FilterKind;
pub use spec::{FilterSpec, FlowNode, PipelineSpec, END_FILTER};
