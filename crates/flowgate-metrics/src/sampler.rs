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
use std::time::Duration;

const SAMPLE_CAPACITY: usize = 1024;

/// The quantiles exported by [`DurationSampler::percentiles`], in order:
/// P25, P50, P75, P95, P98, P99, P999.
pub const QUANTILES: [f64; 7] = [0.25, 0.5, 0.75, 0.95, 0.98, 0.99, 0.999];

/// Bounded sample set of request durations between two snapshots.
///
/// A fixed ring of atomic slots: writers are lock-free and overwrite the
/// oldest sample once the ring is full. `percentiles` and `reset` are only
/// called by the snapshot path, which holds the `HttpStat` writer lock, so
/// reads never race a reset.
#[derive(Debug)]
pub struct DurationSampler {
    samples: Vec<AtomicU64>,
    /// Total samples recorded since the last reset; slot index is this
    /// value modulo the capacity.
    next: AtomicU64,
}

impl DurationSampler {
    pub fn new() -> Self {
        Self {
            samples: (0..SAMPLE_CAPACITY).map(|_| AtomicU64::new(0)).collect(),
            next: AtomicU64::new(0),
        }
    }

    /// Records one duration, in milliseconds resolution.
    pub fn update(&self, duration: Duration) {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % SAMPLE_CAPACITY as u64;
        self.samples[idx as usize].store(duration.as_millis() as u64, Ordering::Relaxed);
    }

    fn occupied(&self) -> usize {
        (self.next.load(Ordering::Relaxed) as usize).min(SAMPLE_CAPACITY)
    }

    /// The seven [`QUANTILES`] of the samples recorded since the last
    /// reset, in milliseconds. All zeros when no sample was recorded.
    pub fn percentiles(&self) -> [f64; 7] {
        let occupied = self.occupied();
        if occupied == 0 {
            return [0.0; 7];
        }

        let mut samples: Vec<u64> = self.samples[..occupied]
            .iter()
            .map(|s| s.load(Ordering::Relaxed))
            .collect();
        samples.sort_unstable();

        let mut result = [0.0; 7];
        for (slot, quantile) in result.iter_mut().zip(QUANTILES) {
            let idx = ((occupied as f64) * quantile) as usize;
            *slot = samples[idx.min(occupied - 1)] as f64;
        }
        result
    }

    /// Discards all samples; the next snapshot window starts empty.
    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

impl Default for DurationSampler {
    fn default() -> Self {
        Self::new()
    }
}
