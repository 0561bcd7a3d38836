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

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Seconds between ticks; the decay constants below are derived for this
/// cadence.
pub const TICK_INTERVAL_SECS: f64 = 5.0;

/// An exponentially weighted moving average of an event rate.
///
/// `update` is lock-free and safe from any number of threads; `tick` and
/// `rate` are expected to run on a single sampling thread (in Flowgate,
/// under the `HttpStat` writer lock). The rate is in events per second.
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    uncounted: AtomicU64,
    /// Bit pattern of the current rate (f64).
    rate: AtomicU64,
    initialized: AtomicBool,
}

impl Ewma {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            uncounted: AtomicU64::new(0),
            rate: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// EWMA decaying over a one-minute window.
    pub fn one_minute() -> Self {
        Self::new(1.0 - (-TICK_INTERVAL_SECS / 60.0).exp())
    }

    /// EWMA decaying over a five-minute window.
    pub fn five_minutes() -> Self {
        Self::new(1.0 - (-TICK_INTERVAL_SECS / (60.0 * 5.0)).exp())
    }

    /// EWMA decaying over a fifteen-minute window.
    pub fn fifteen_minutes() -> Self {
        Self::new(1.0 - (-TICK_INTERVAL_SECS / (60.0 * 15.0)).exp())
    }

    /// Records `n` events.
    pub fn update(&self, n: u64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Folds the events recorded since the last tick into the average.
    /// Must be called once per [`TICK_INTERVAL_SECS`].
    pub fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::Relaxed) as f64;
        let instant_rate = count / TICK_INTERVAL_SECS;

        if self.initialized.load(Ordering::Acquire) {
            let rate = f64::from_bits(self.rate.load(Ordering::Relaxed));
            let next = rate + self.alpha * (instant_rate - rate);
            self.rate.store(next.to_bits(), Ordering::Relaxed);
        } else {
            self.rate.store(instant_rate.to_bits(), Ordering::Relaxed);
            self.initialized.store(true, Ordering::Release);
        }
    }

    /// The current rate in events per second.
    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate.load(Ordering::Relaxed))
    }
}
