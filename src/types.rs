//! Per-call snapshots of HTTP request and response data.
//!
//! These are transient values: the interceptor builds one, formats it into a
//! log line and drops it. Nothing here outlives a single intercepted call.

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use bytes::Bytes;
use std::time::Duration;

/// Snapshot of an outgoing request, taken before it is forwarded.
#[derive(Debug, Clone)]
pub(crate) struct RequestRecord {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Full request URI
    pub uri: Uri,
    /// Request headers, original order preserved
    pub headers: HeaderMap,
    /// Buffered request body, when body logging or field echoing is enabled
    pub body: Option<Bytes>,
}

/// Snapshot of a received response, paired with its originating request.
#[derive(Debug, Clone)]
pub(crate) struct ResponseRecord {
    /// Method of the request that produced this response
    pub method: Method,
    /// URI of the request that produced this response
    pub uri: Uri,
    /// HTTP status code
    pub status: StatusCode,
    /// Reason text supplied by the transport, if any
    pub reason: Option<String>,
    /// Response headers, original order preserved
    pub headers: HeaderMap,
    /// Buffered response body, when the applicable body flag is enabled and
    /// the body could be read
    pub body: Option<Bytes>,
    /// The originating request's buffered body, used for field echoing
    pub request_body: Option<Bytes>,
    /// Time from sending the request to receiving the response
    pub elapsed: Duration,
}

/// Reason phrase supplied by a transport, carried in response extensions.
///
/// The `http` response type has no slot for the wire reason text, so a
/// transport that knows it (or a test) inserts this extension. A blank value
/// is treated the same as an absent one and falls back to the static status
/// table.
///
/// # Examples
///
/// ```rust
/// use axum::{body::Body, http::Response};
/// use debug_interceptor::ReasonPhrase;
///
/// let mut response = Response::new(Body::empty());
/// response.extensions_mut().insert(ReasonPhrase("Completely Fine".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(pub String);
