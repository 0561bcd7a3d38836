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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One request observation, typically produced by the filter that talked to
/// the backend.
#[derive(Debug, Clone)]
pub struct Metric {
    pub status_code: u16,
    pub duration: Duration,
    pub req_size: u64,
    pub resp_size: u64,
}

impl Metric {
    pub fn is_err(&self) -> bool {
        self.status_code >= 400
    }
}

/// Complete statistics snapshot at one sampling instant.
///
/// Counts and sizes are cumulative for the life of the `HttpStat`; the
/// percentiles and the code histogram cover only the window since the
/// previous snapshot. Latency figures are in milliseconds, rates in
/// requests per second.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub count: u64,
    pub m1: f64,
    pub m5: f64,
    pub m15: f64,

    pub err_count: u64,
    pub m1_err: f64,
    pub m5_err: f64,
    pub m15_err: f64,

    pub m1_err_percent: f64,
    pub m5_err_percent: f64,
    pub m15_err_percent: f64,

    pub min: u64,
    pub max: u64,
    pub mean: u64,

    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,

    pub req_size: u64,
    pub resp_size: u64,

    pub codes: HashMap<u16, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_error_threshold() {
        let metric = |code| Metric {
            status_code: code,
            duration: Duration::ZERO,
            req_size: 0,
            resp_size: 0,
        };
        assert!(!metric(200).is_err());
        assert!(!metric(399).is_err());
        assert!(metric(400).is_err());
        assert!(metric(500).is_err());
    }

    #[test]
    fn test_status_export_field_names() {
        let status = Status {
            count: 3,
            err_count: 1,
            m1_err_percent: 0.5,
            req_size: 10,
            resp_size: 20,
            ..Default::default()
        };

        let value = serde_json::to_value(&status).unwrap();
        for field in [
            "count",
            "m1",
            "m5",
            "m15",
            "errCount",
            "m1Err",
            "m5Err",
            "m15Err",
            "m1ErrPercent",
            "m5ErrPercent",
            "m15ErrPercent",
            "min",
            "max",
            "mean",
            "p25",
            "p50",
            "p75",
            "p95",
            "p98",
            "p99",
            "p999",
            "reqSize",
            "respSize",
            "codes",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_status_yaml_round_trip() {
        let mut status = Status {
            count: 10,
            err_count: 2,
            min: 1,
            max: 40,
            mean: 12,
            ..Default::default()
        };
        status.codes.insert(200, 8);
        status.codes.insert(500, 2);

        let doc = serde_yaml::to_string(&status).unwrap();
        let round: Status = serde_yaml::from_str(&doc).unwrap();
        assert_eq!(round, status);
    }
}
