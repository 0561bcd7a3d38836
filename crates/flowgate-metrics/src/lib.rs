// Copyright 2025 Flowgate Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Flowgate Traffic Statistics
//!
//! This crate provides a thread-safe, high-performance statistics tool for
//! HTTP traffic flowing through a gateway pipeline. It tracks request and
//! error counts, 1/5/15-minute EWMA rates, latency extremes and percentiles,
//! body sizes, and a status-code histogram.
//!
//! # Architecture
//!
//! The stats system is built around three components:
//!
//! - [`HttpStat`]: the per-endpoint accumulator with a lock-free fast path
//! - [`Metric`]: one request observation (status, duration, body sizes)
//! - [`Status`]: the serializable snapshot produced on each sampling tick
//!
//! # Concurrency Model
//!
//! `HttpStat` uses a hybrid model:
//! - Lock-free atomics for every fast-path update ([`HttpStat::stat`])
//! - A reader/writer lock whose only purpose is to exclude the snapshot
//!   path ([`HttpStat::status`]) while it ticks the EWMAs and drains the
//!   percentile reservoir and the status-code histogram
//!
//! # Sampling Contract
//!
//! The EWMA decay constants follow the classic UNIX load-average
//! formulation for 5-second ticks, so callers must take a snapshot every
//! 5 seconds for the 1/5/15-minute rates to mean what they say.
//!
//! # Usage Example
//!
//! ```rust
//! use flowgate_metrics::{HttpStat, Metric};
//! use std::time::Duration;
//!
//! let stat = HttpStat::new();
//!
//! stat.stat(&Metric {
//!     status_code: 200,
//!     duration: Duration::from_millis(12),
//!     req_size: 512,
//!     resp_size: 2048,
//! });
//!
//! let status = stat.status();
//! assert_eq!(status.count, 1);
//! assert_eq!(status.err_count, 0);
//! ```

mod codecounter;
mod ewma;
mod sampler;
mod snapshot;
mod stat;

pub use codecounter::CodeCounter;
pub use ewma::Ewma;
pub use sampler::DurationSampler;
pub use snapshot::{Metric, Status};
pub use stat::HttpStat;
