//! Per-request context threaded through a pipeline.
//!
//! The context carries the active HTTP request and response plus every
//! *named* request/response snapshot produced along the flow. Flow nodes may
//! label the request a filter produces (`requestID`) or switch the active
//! request back to an earlier snapshot (`useRequest`); both operate on the
//! maps held here. Filters only ever see the active entries.

use std::collections::HashMap;
use std::time::Instant;

/// Name of the implicit initial request and response.
pub const DEFAULT_ID: &str = "Default";

/// An HTTP request as seen by filters.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Body size in bytes, as accounted by traffic statistics.
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// An HTTP response being assembled by filters.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status_code: 200,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }
}

impl HttpResponse {
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// Mutable per-request state shared by all filters of one `handle` call.
///
/// The engine owns exactly one `Context` per request; filters execute
/// strictly sequentially, so each filter observes every prior filter's
/// mutations. Cancellation rides on the optional deadline; the engine never
/// interprets it, filters do.
#[derive(Debug)]
pub struct Context {
    requests: HashMap<String, HttpRequest>,
    responses: HashMap<String, HttpResponse>,
    active_request: String,
    active_response: String,
    tags: Vec<String>,
    deadline: Option<Instant>,
}

impl Context {
    /// Creates a context for one inbound request, stored under
    /// [`DEFAULT_ID`].
    pub fn new(request: HttpRequest) -> Self {
        let mut requests = HashMap::new();
        requests.insert(DEFAULT_ID.to_string(), request);
        let mut responses = HashMap::new();
        responses.insert(DEFAULT_ID.to_string(), HttpResponse::default());

        Self {
            requests,
            responses,
            active_request: DEFAULT_ID.to_string(),
            active_response: DEFAULT_ID.to_string(),
            tags: Vec::new(),
            deadline: None,
        }
    }

    /// The active request.
    pub fn request(&self) -> &HttpRequest {
        &self.requests[&self.active_request]
    }

    pub fn request_mut(&mut self) -> &mut HttpRequest {
        self.requests
            .get_mut(&self.active_request)
            .expect("active request always exists")
    }

    /// The active response.
    pub fn response(&self) -> &HttpResponse {
        &self.responses[&self.active_response]
    }

    pub fn response_mut(&mut self) -> &mut HttpResponse {
        self.responses
            .get_mut(&self.active_response)
            .expect("active response always exists")
    }

    /// Switches the active request to a previously produced snapshot.
    ///
    /// Returns `false` if no snapshot with that name exists; a validated
    /// flow never takes that branch.
    pub fn use_request(&mut self, id: &str) -> bool {
        if self.requests.contains_key(id) {
            self.active_request = id.to_string();
            true
        } else {
            false
        }
    }

    /// Snapshots the active request under `id` and makes the copy active,
    /// so the upcoming filter's mutations land in the named entry.
    pub fn label_request(&mut self, id: &str) {
        let snapshot = self.request().clone();
        self.requests.insert(id.to_string(), snapshot);
        self.active_request = id.to_string();
    }

    /// Same discipline as [`Context::label_request`], for the response side.
    pub fn label_response(&mut self, id: &str) {
        let snapshot = self.response().clone();
        self.responses.insert(id.to_string(), snapshot);
        self.active_response = id.to_string();
    }

    /// Attaches a trace tag to this request.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
