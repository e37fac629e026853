//! # debug-interceptor
//!
//! A Tower middleware that logs outgoing HTTP requests, their responses and
//! any transport failures as human-readable debug lines, without disturbing
//! the call it wraps.
//!
//! ## Features
//!
//! - **Non-consuming body capture**: bodies are buffered, logged and handed
//!   back byte-identical to the downstream reader
//! - **Configurable sections**: headers and bodies can be toggled per
//!   direction, with a separate flag for error-response bodies
//! - **Field echoing**: selected request-body JSON fields can be repeated on
//!   the response line for correlation
//! - **Transparent error handling**: transport errors are logged and
//!   re-raised unchanged; failures inside the logger itself never affect the
//!   call
//!
//! ## Quick Start
//!
//! ```rust
//! use axum::body::Body;
//! use axum::http::{Request, Response};
//! use debug_interceptor::{DebugConfig, DebugInterceptorLayer};
//! use std::convert::Infallible;
//! use tower::{service_fn, Layer, Service, ServiceExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Infallible> {
//!     // Stands in for the real transport at the end of the chain.
//!     let transport = service_fn(|_req: Request<Body>| async {
//!         Ok::<_, Infallible>(Response::new(Body::from(r#"{"ok":true}"#)))
//!     });
//!
//!     let config = DebugConfig::new().log_response_body(true);
//!     let mut client = DebugInterceptorLayer::new(config).layer(transport);
//!
//!     let request = Request::get("https://api.example.com/items")
//!         .body(Body::empty())
//!         .unwrap();
//!     let response = client.ready().await?.call(request).await?;
//!     assert!(response.status().is_success());
//!     Ok(())
//! }
//! ```
//!
//! ## Output format
//!
//! ```text
//! [REQUEST] | METHOD: GET | URL: https://api.example.com/items
//! |   authorization: Bearer X
//! | BODY: [NONE]
//!
//! [RESPONSE] | METHOD: GET | URL: https://api.example.com/items | STATUS: 200 (OK) | TIME: 120 ms
//! | BODY: size: 11 bytes, content: {"ok":true}
//!
//! [ERROR] | METHOD: GET | URL: https://api.example.com/items | EXCEPTION: io::Error | MESSAGE: connection refused
//! ```
//!
//! Lines go to a [`LogSink`]: informational lines (requests, 2xx responses)
//! through [`LogSink::d`], everything else through [`LogSink::e`]. The
//! default sink forwards to `tracing`.

use axum::body::Body;
use axum::http::{Request, Response};
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};

mod body;
mod format;
pub mod sink;
pub mod status;
mod types;

pub use sink::{LogSink, TracingSink};
pub use types::ReasonPhrase;

use types::{RequestRecord, ResponseRecord};

/// Configuration for the debug interceptor.
///
/// Builder-style: every setter consumes and returns the configuration so
/// calls can be chained. Configure before attaching the layer to a call
/// path; the configuration is immutable once in use.
///
/// # Examples
///
/// ```rust
/// use debug_interceptor::DebugConfig;
///
/// let config = DebugConfig::new()
///     .log_response_body(true)
///     .echo_request_fields(["userId", "method"]);
/// ```
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub(crate) log_request_headers: bool,
    pub(crate) log_request_body: bool,
    pub(crate) log_response_headers: bool,
    pub(crate) log_response_body: bool,
    pub(crate) log_response_error_body: bool,
    pub(crate) echo_fields: Vec<String>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_request_headers: true,
            log_request_body: true,
            log_response_headers: true,
            log_response_body: false,
            log_response_error_body: true,
            echo_fields: Vec::new(),
        }
    }
}

impl DebugConfig {
    /// Default configuration: request headers, request body and response
    /// headers on; response body off for successes, on for errors; no field
    /// echoing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include request headers in the request line. Default: on.
    pub fn log_request_headers(mut self, enabled: bool) -> Self {
        self.log_request_headers = enabled;
        self
    }

    /// Include the request body in the request line. Default: on.
    pub fn log_request_body(mut self, enabled: bool) -> Self {
        self.log_request_body = enabled;
        self
    }

    /// Include response headers in the response line. Default: on.
    pub fn log_response_headers(mut self, enabled: bool) -> Self {
        self.log_response_headers = enabled;
        self
    }

    /// Include the response body in the response line for successful (2xx)
    /// responses. Default: off.
    pub fn log_response_body(mut self, enabled: bool) -> Self {
        self.log_response_body = enabled;
        self
    }

    /// Include the response body in the response line for non-2xx responses.
    /// Default: on.
    pub fn log_response_error_body(mut self, enabled: bool) -> Self {
        self.log_response_error_body = enabled;
        self
    }

    /// Echo the named request-body JSON fields onto the response line.
    ///
    /// Useful when an API multiplexes operations over one URL and the
    /// operation name lives in the request body. An empty list (the default)
    /// disables the feature.
    pub fn echo_request_fields<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.echo_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Tower layer that wraps a service with [`DebugInterceptorService`].
///
/// This is the main entry point. Build it with a [`DebugConfig`] and attach
/// it wherever a tower layer fits; every call through the wrapped service is
/// logged.
///
/// # Examples
///
/// ```rust
/// use debug_interceptor::{DebugConfig, DebugInterceptorLayer};
///
/// let layer = DebugInterceptorLayer::new(
///     DebugConfig::new().log_response_body(true),
/// );
/// ```
#[derive(Clone)]
pub struct DebugInterceptorLayer {
    config: Arc<DebugConfig>,
    sink: Arc<dyn LogSink>,
}

impl DebugInterceptorLayer {
    /// Create a layer that logs through the default [`TracingSink`].
    pub fn new(config: DebugConfig) -> Self {
        Self::with_sink(config, TracingSink)
    }

    /// Create a layer that logs through a custom [`LogSink`].
    pub fn with_sink<K: LogSink>(config: DebugConfig, sink: K) -> Self {
        Self {
            config: Arc::new(config),
            sink: Arc::new(sink),
        }
    }
}

impl<S> Layer<S> for DebugInterceptorLayer {
    type Service = DebugInterceptorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DebugInterceptorService {
            inner,
            config: Arc::clone(&self.config),
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Tower service that logs each call before handing it to the inner service.
///
/// The inner service plays the role of "proceed": it is invoked exactly once
/// per call, its response is returned byte-identical (including an
/// unconsumed body) and its error is re-raised unchanged. Created by
/// [`DebugInterceptorLayer`]; users don't normally name this type.
#[derive(Clone)]
pub struct DebugInterceptorService<S> {
    inner: S,
    config: Arc<DebugConfig>,
    sink: Arc<dyn LogSink>,
}

impl<S> Service<Request<Body>> for DebugInterceptorService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let sink = Arc::clone(&self.sink);

        // The service whose readiness was just polled is the one that must
        // receive the call; hand the fresh clone back to self.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let method = request.method().clone();
            let uri = request.uri().clone();
            let request_headers = request.headers().clone();

            // The request body has not been transmitted yet, so buffering it
            // here and replaying it is safe. Needed for body logging and for
            // field echoing on the response line.
            let want_request_body = config.log_request_body || !config.echo_fields.is_empty();
            let request_body = if want_request_body {
                let body = std::mem::replace(request.body_mut(), Body::empty());
                match body::buffer_body(body).await {
                    Ok(bytes) => {
                        *request.body_mut() = Body::from(bytes.clone());
                        Some(bytes)
                    }
                    Err(err) => {
                        sink.e(
                            "debug interceptor could not buffer the request body",
                            Some(&err),
                        );
                        *request.body_mut() = body::error_body(err);
                        None
                    }
                }
            } else {
                None
            };

            let record = RequestRecord {
                method: method.clone(),
                uri: uri.clone(),
                headers: request_headers,
                body: request_body.clone(),
            };
            sink.d(&format::request_line(&record, &config));

            let started = Instant::now();

            match inner.call(request).await {
                Err(error) => {
                    let line = format::error_line(
                        &method,
                        &uri,
                        std::any::type_name::<S::Error>(),
                        &error.to_string(),
                    );
                    sink.e(&line, Some(&error));
                    Err(error)
                }
                Ok(mut response) => {
                    let elapsed = started.elapsed();
                    let status = response.status();
                    let success = status.is_success();

                    let want_response_body = if success {
                        config.log_response_body
                    } else {
                        config.log_response_error_body
                    };
                    let response_body = if want_response_body {
                        let body = std::mem::replace(response.body_mut(), Body::empty());
                        match body::buffer_body(body).await {
                            Ok(bytes) => {
                                *response.body_mut() = Body::from(bytes.clone());
                                Some(bytes)
                            }
                            Err(err) => {
                                sink.e(
                                    "debug interceptor could not buffer the response body",
                                    Some(&err),
                                );
                                *response.body_mut() = body::error_body(err);
                                None
                            }
                        }
                    } else {
                        None
                    };

                    let record = ResponseRecord {
                        method,
                        uri,
                        status,
                        reason: response
                            .extensions()
                            .get::<ReasonPhrase>()
                            .map(|r| r.0.clone()),
                        headers: response.headers().clone(),
                        body: response_body,
                        request_body,
                        elapsed,
                    };
                    let line = format::response_line(&record, &config);
                    if success {
                        sink.d(&line);
                    } else {
                        sink.e(&line, None);
                    }

                    Ok(response)
                }
            }
        })
    }
}
