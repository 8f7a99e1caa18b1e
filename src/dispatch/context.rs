//! Per-request context handed to route handlers.
//!
//! # Responsibilities
//! - Carry validated body/params/query plus the raw request
//! - Collect the handler's writes and turn them into one response
//!
//! # Design Decisions
//! - The first write decides what goes on the wire; later writes are kept
//!   for inspection and logged, matching "headers already sent" semantics
//! - Status set through `status()` is pending until the next `send`

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// Something a handler can send back.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
    Bytes(Bytes),
}

impl Payload {
    /// Empty payloads are not auto-sent for handler return values.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(s) => s.is_empty(),
            Payload::Json(v) => v.is_null(),
            Payload::Bytes(b) => b.is_empty(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text/plain; charset=utf-8",
            Payload::Json(_) => "application/json",
            Payload::Bytes(_) => "application/octet-stream",
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            Payload::Text(s) => Bytes::from(s),
            Payload::Json(v) => Bytes::from(v.to_string()),
            Payload::Bytes(b) => b,
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Json(v)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(b))
    }
}

/// One `send` call as the handler made it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub status: StatusCode,
    pub payload: Payload,
}

#[derive(Debug)]
struct WriterState {
    status: StatusCode,
    headers: HeaderMap,
    writes: Vec<RecordedWrite>,
}

/// Response handle shared between the handler and the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    state: Arc<Mutex<WriterState>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(WriterState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                writes: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status used by the next `send`.
    pub fn status(&self, status: StatusCode) -> &Self {
        self.lock().status = status;
        self
    }

    /// Add a response header. Ignored once the response is committed.
    pub fn header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        let mut state = self.lock();
        if state.writes.is_empty() {
            state.headers.insert(name, value);
        } else {
            tracing::warn!(header = %name, "header set after response was committed");
        }
        self
    }

    /// Write a payload with the pending status.
    pub fn send(&self, payload: impl Into<Payload>) {
        let status = self.lock().status;
        self.write(status, payload.into());
    }

    /// Write a payload with an explicit status, leaving the pending one untouched.
    pub fn send_with(&self, status: StatusCode, payload: impl Into<Payload>) {
        self.write(status, payload.into());
    }

    fn write(&self, status: StatusCode, payload: Payload) {
        let mut state = self.lock();
        if !state.writes.is_empty() {
            tracing::warn!(
                status = status.as_u16(),
                first_status = state.writes[0].status.as_u16(),
                "response already committed, write recorded but not sent"
            );
        }
        state.writes.push(RecordedWrite { status, payload });
    }

    pub fn is_committed(&self) -> bool {
        !self.lock().writes.is_empty()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    /// Build the wire response from the first write, or an empty body with the pending status.
    pub fn into_response(self) -> Response {
        let mut state = self.lock();
        let headers = std::mem::take(&mut state.headers);
        let first = state.writes.first().cloned();
        let pending = state.status;
        drop(state);

        let mut response = match first {
            Some(write) => {
                let content_type = write.payload.content_type();
                let mut response = (write.status, write.payload.into_bytes()).into_response();
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                response
            }
            None => (pending, Body::empty()).into_response(),
        };
        for (name, value) in headers.iter() {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// The request as received, before validation.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub params: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RawRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Last occurrence wins for repeated keys.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as JSON, if it is any.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Request with the declared parts replaced by their parsed values.
///
/// A part that was not declared on the route stays `None`; its raw form is
/// still available through `raw`.
#[derive(Debug, Clone)]
pub struct ValidatedRequest<B, P, Q> {
    pub body: Option<B>,
    pub params: Option<P>,
    pub query: Option<Q>,
    pub raw: RawRequest,
}

/// What a handler receives.
pub struct RouteContext<B = (), P = (), Q = ()> {
    pub req: ValidatedRequest<B, P, Q>,
    pub res: ResponseWriter,
}

impl<B, P, Q> RouteContext<B, P, Q> {
    /// Write `payload` with `status`, or with the pending status when `None`.
    pub fn respond(&self, payload: impl Into<Payload>, status: Option<StatusCode>) {
        match status {
            Some(status) => self.res.send_with(status, payload),
            None => self.res.send(payload),
        }
    }

    /// Take the parsed body, leaving `None` behind.
    pub fn take_body(&mut self) -> Option<B> {
        self.req.body.take()
    }
}
