//! Demonstrates the interceptor around a fake transport.
//!
//! Run with `cargo run --example demo`. The transport stands in for a real
//! HTTP client stack; any tower service with `http` request/response types
//! fits in its place.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use debug_interceptor::{DebugConfig, DebugInterceptorLayer, ReasonPhrase};
use std::convert::Infallible;
use tower::{service_fn, Layer, ServiceExt};
use tracing::Level;

async fn fake_transport(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let response = match req.uri().path() {
        "/items" => Response::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"items": ["a", "b"], "total": 2}"#))
            .unwrap(),
        "/rpc" => Response::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"result": "ok"}"#))
            .unwrap(),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .extension(ReasonPhrase("Not Found".into()))
            .body(Body::from(r#"{"error": "unknown path"}"#))
            .unwrap(),
    };
    Ok(response)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let config = DebugConfig::new()
        .log_response_body(true)
        .echo_request_fields(["method"]);
    let layer = DebugInterceptorLayer::new(config);

    // A plain GET.
    let service = layer.layer(service_fn(fake_transport));
    let request = Request::get("https://api.example.com/items")
        .header("authorization", "Bearer demo-token")
        .body(Body::empty())
        .unwrap();
    service.oneshot(request).await.unwrap();

    // An RPC-style POST whose body names the operation; the configured
    // "method" field shows up on the response line.
    let service = layer.layer(service_fn(fake_transport));
    let request = Request::post("https://api.example.com/rpc")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"method": "getItems", "userId": 42}"#))
        .unwrap();
    service.oneshot(request).await.unwrap();

    // A miss, logged at error severity with the error body.
    let service = layer.layer(service_fn(fake_transport));
    let request = Request::get("https://api.example.com/nope")
        .body(Body::empty())
        .unwrap();
    service.oneshot(request).await.unwrap();
}
