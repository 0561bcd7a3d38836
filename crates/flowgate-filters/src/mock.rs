//! Mock responder filter.
//!
//! Terminates a pipeline by writing a configured response onto the context,
//! the way a proxy filter would after talking to a backend. Each instance
//! owns an [`HttpStat`] and records one [`Metric`] per request, so its
//! `status()` exports the full traffic snapshot for its endpoint.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use flowgate_core::registry::{self, FilterKind};
use flowgate_core::{Context, Filter, FilterSpec, Result};
use flowgate_metrics::{HttpStat, Metric};

pub const KIND: &str = "Mock";

const RESULTS: &[&str] = &[];

fn default_code() -> u16 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Status code of the synthesized response.
    #[serde(default = "default_code")]
    pub code: u16,

    /// Response body.
    #[serde(default)]
    pub body: String,

    /// Extra response headers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            code: default_code(),
            body: String::new(),
            headers: HashMap::new(),
        }
    }
}

/// Responds to every request with a fixed response.
pub struct Mock {
    config: MockConfig,
    stat: Arc<HttpStat>,
}

impl Mock {
    fn new() -> Self {
        Self {
            config: MockConfig::default(),
            stat: Arc::new(HttpStat::new()),
        }
    }
}

impl Filter for Mock {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn init(&mut self, spec: &FilterSpec) -> Result<()> {
        self.config = spec.config()?;
        Ok(())
    }

    fn inherit(&mut self, spec: &FilterSpec, prev: &dyn Filter) -> Result<()> {
        self.init(spec)?;
        // Traffic statistics keep accumulating across the reload.
        if let Some(prev) = prev.as_any().downcast_ref::<Mock>() {
            self.stat = Arc::clone(&prev.stat);
        }
        Ok(())
    }

    fn handle(&self, ctx: &mut Context) -> String {
        let start = Instant::now();
        let req_size = ctx.request().size();

        let resp = ctx.response_mut();
        resp.status_code = self.config.code;
        resp.body = self.config.body.clone().into_bytes();
        for (name, value) in &self.config.headers {
            resp.set_header(name.clone(), value.clone());
        }
        let resp_size = resp.size();

        self.stat.stat(&Metric {
            status_code: self.config.code,
            duration: start.elapsed(),
            req_size,
            resp_size,
        });

        String::new()
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.stat.status()).unwrap_or(serde_json::Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn register() {
    registry::register(FilterKind {
        name: KIND,
        results: RESULTS,
        default_spec: || json!({"kind": KIND, "code": default_code()}),
        create: || Box::new(Mock::new()),
        check_spec: |spec| spec.config::<MockConfig>().map(|_| ()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgate_core::HttpRequest;
    use serde_json::json;

    fn spec(body: serde_json::Value) -> FilterSpec {
        FilterSpec::new(body).unwrap()
    }

    #[test]
    fn test_mock_writes_configured_response() {
        let mut mock = Mock::new();
        mock.init(&spec(json!({
            "name": "backend",
            "kind": "Mock",
            "code": 503,
            "body": "unavailable",
            "headers": {"Content-Type": "text/plain"},
        })))
        .unwrap();

        let mut ctx = Context::new(HttpRequest::new("GET", "/"));
        assert_eq!(mock.handle(&mut ctx), "");

        assert_eq!(ctx.response().status_code, 503);
        assert_eq!(ctx.response().body, b"unavailable");
        assert_eq!(
            ctx.response().headers.get("Content-Type").map(String::as_str),
            Some("text/plain")
        );
    }

    #[test]
    fn test_mock_records_traffic_stats() {
        let mut mock = Mock::new();
        mock.init(&spec(json!({"name": "backend", "kind": "Mock", "code": 500})))
            .unwrap();

        let mut ctx = Context::new(HttpRequest::new("POST", "/").with_body(vec![0u8; 64]));
        mock.handle(&mut ctx);
        mock.handle(&mut Context::new(HttpRequest::new("GET", "/")));

        let status = mock.status();
        assert_eq!(status["count"], json!(2));
        assert_eq!(status["errCount"], json!(2));
        assert_eq!(status["reqSize"], json!(64));
    }

    #[test]
    fn test_mock_inherit_keeps_stats() {
        let mut first = Mock::new();
        first
            .init(&spec(json!({"name": "backend", "kind": "Mock"})))
            .unwrap();
        first.handle(&mut Context::new(HttpRequest::new("GET", "/")));

        let mut second = Mock::new();
        second
            .inherit(&spec(json!({"name": "backend", "kind": "Mock", "code": 204})), &first)
            .unwrap();
        second.handle(&mut Context::new(HttpRequest::new("GET", "/")));

        assert_eq!(second.status()["count"], json!(2));
    }

    #[test]
    fn test_mock_default_config() {
        let config: MockConfig =
            spec(json!({"name": "backend", "kind": "Mock"})).config().unwrap();
        assert_eq!(config.code, 200);
        assert!(config.body.is_empty());
    }
}
