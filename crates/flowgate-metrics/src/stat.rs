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

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::codecounter::CodeCounter;
use crate::ewma::Ewma;
use crate::sampler::DurationSampler;
use crate::snapshot::{Metric, Status};

/// Statistics accumulator for the HTTP traffic of one endpoint.
#[derive(Debug)]
pub struct HttpStat {
    mutex: RwLock<()>,

    count: AtomicU64,
    rate1: Ewma,
    rate5: Ewma,
    rate15: Ewma,

    err_count: AtomicU64,
    err_rate1: Ewma,
    err_rate5: Ewma,
    err_rate15: Ewma,

    /// Total duration in milliseconds.
    total: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,

    duration_sampler: DurationSampler,

    req_size: AtomicU64,
    resp_size: AtomicU64,

    cc: CodeCounter,
}

impl HttpStat {
    pub fn new() -> Self {
        Self {
            mutex: RwLock::new(()),

            count: AtomicU64::new(0),
            rate1: Ewma::one_minute(),
            rate5: Ewma::five_minutes(),
            rate15: Ewma::fifteen_minutes(),

            err_count: AtomicU64::new(0),
            err_rate1: Ewma::one_minute(),
            err_rate5: Ewma::five_minutes(),
            err_rate15: Ewma::fifteen_minutes(),

            total: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),

            duration_sampler: DurationSampler::new(),

            req_size: AtomicU64::new(0),
            resp_size: AtomicU64::new(0),

            cc: CodeCounter::new(),
        }
    }

    /// Records one request observation.
    ///
    /// Note: although this is a data update operation, it takes the *read*
    /// guard, so any number of threads record concurrently; contention is
    /// handled by the per-item atomics. The lock exists solely to exclude
    /// [`HttpStat::status`] while it ticks and drains.
    pub fn stat(&self, m: &Metric) {
        let _guard = self.mutex.read().unwrap();

        self.count.fetch_add(1, Ordering::Relaxed);
        self.rate1.update(1);
        self.rate5.update(1);
        self.rate15.update(1);

        if m.is_err() {
            self.err_count.fetch_add(1, Ordering::Relaxed);
            self.err_rate1.update(1);
            self.err_rate5.update(1);
            self.err_rate15.update(1);
        }

        let duration = m.duration.as_millis() as u64;
        self.total.fetch_add(duration, Ordering::Relaxed);
        self.min.fetch_min(duration, Ordering::Relaxed);
        self.max.fetch_max(duration, Ordering::Relaxed);

        self.duration_sampler.update(m.duration);

        self.req_size.fetch_add(m.req_size, Ordering::Relaxed);
        self.resp_size.fetch_add(m.resp_size, Ordering::Relaxed);

        self.cc.count(m.status_code);
    }

    /// Takes a snapshot, ticking the EWMAs and draining the percentile
    /// reservoir and the status-code histogram.
    ///
    /// The EWMA decay constants assume this is called every five seconds.
    pub fn status(&self) -> Status {
        let _guard = self.mutex.write().unwrap();

        self.rate1.tick();
        self.rate5.tick();
        self.rate15.tick();
        self.err_rate1.tick();
        self.err_rate5.tick();
        self.err_rate15.tick();

        let (m1, m5, m15) = (self.rate1.rate(), self.rate5.rate(), self.rate15.rate());
        let (m1_err, m5_err, m15_err) = (
            self.err_rate1.rate(),
            self.err_rate5.rate(),
            self.err_rate15.rate(),
        );

        let percent = |err: f64, total: f64| if total > 0.0 { err / total } else { 0.0 };
        let m1_err_percent = percent(m1_err, m1);
        let m5_err_percent = percent(m5_err, m5);
        let m15_err_percent = percent(m15_err, m15);

        let [p25, p50, p75, p95, p98, p99, p999] = self.duration_sampler.percentiles();
        self.duration_sampler.reset();

        let codes = self.cc.codes();
        self.cc.reset();

        let count = self.count.load(Ordering::Relaxed);
        let (mean, min) = if count > 0 {
            (
                self.total.load(Ordering::Relaxed) / count,
                self.min.load(Ordering::Relaxed),
            )
        } else {
            (0, 0)
        };

        Status {
            count,
            m1,
            m5,
            m15,

            err_count: self.err_count.load(Ordering::Relaxed),
            m1_err,
            m5_err,
            m15_err,

            m1_err_percent,
            m5_err_percent,
            m15_err_percent,

            min,
            max: self.max.load(Ordering::Relaxed),
            mean,

            p25,
            p50,
            p75,
            p95,
            p98,
            p99,
            p999,

            req_size: self.req_size.load(Ordering::Relaxed),
            resp_size: self.resp_size.load(Ordering::Relaxed),

            codes,
        }
    }
}

impl Default for HttpStat {
    fn default() -> Self {
        Self::new()
    }
}
