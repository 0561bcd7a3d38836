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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

const CODE_MIN: u16 = 100;
const CODE_MAX: u16 = 599;

/// Lock-free histogram of HTTP status codes between two snapshots.
///
/// One atomic slot per code in the 100..=599 range; codes outside the range
/// are dropped. `codes` and `reset` are only called by the snapshot path.
#[derive(Debug)]
pub struct CodeCounter {
    counts: Vec<AtomicU64>,
}

impl CodeCounter {
    pub fn new() -> Self {
        Self {
            counts: (CODE_MIN..=CODE_MAX).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Counts one response with the given status code.
    pub fn count(&self, code: u16) {
        if (CODE_MIN..=CODE_MAX).contains(&code) {
            self.counts[(code - CODE_MIN) as usize].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// All non-zero code counts since the last reset.
    pub fn codes(&self) -> HashMap<u16, u64> {
        self.counts
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let count = slot.load(Ordering::Relaxed);
                (count > 0).then_some((CODE_MIN + i as u16, count))
            })
            .collect()
    }

    /// Zeroes the histogram.
    pub fn reset(&self) {
        for slot in &self.counts {
            slot.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for CodeCounter {
    fn default() -> Self {
        Self::new()
    }
}
