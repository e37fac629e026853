//! Body buffering utilities.
//!
//! The interceptor needs to look at request and response bodies without
//! taking them away from whoever reads them next. Bodies are forced into an
//! in-memory buffer, the buffer is logged, and a byte-identical body is
//! rebuilt from it for the downstream reader.

use axum::body::{Body, Bytes};
use futures::stream;
use http_body_util::BodyExt;

/// Error type for body buffering operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("body stream error: {0}")]
    Stream(String),
}

/// Collect a body fully into memory.
///
/// No size cap is applied; bounded only by available memory. The caller is
/// expected to rebuild a replacement body from the returned bytes so the
/// original consumer still sees the full content.
pub(crate) async fn buffer_body(body: Body) -> Result<Bytes, BufferError> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| BufferError::Stream(e.to_string()))
}

/// Build a body that yields the given buffering error on first poll.
///
/// Used when buffering fails mid-stream: the downstream reader must still
/// observe the failure through the normal consumption path rather than
/// receiving a silently truncated body.
pub(crate) fn error_body(err: BufferError) -> Body {
    Body::from_stream(stream::once(async move { Err::<Bytes, BufferError>(err) }))
}

#[cfg(test)]
mod tests {
    use super::{buffer_body, error_body, BufferError};
    use axum::body::Body;
    use bytes::Bytes;
    use futures::stream;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn buffers_full_body() {
        let body = Body::from("Hello, World!");
        let bytes = buffer_body(body).await.unwrap();
        assert_eq!(bytes, "Hello, World!");
    }

    #[tokio::test]
    async fn buffers_chunked_body() {
        let chunks = stream::iter(vec![
            Ok::<_, std::convert::Infallible>(Bytes::from("chunk1")),
            Ok(Bytes::from("chunk2")),
            Ok(Bytes::from("chunk3")),
        ]);
        let bytes = buffer_body(Body::from_stream(chunks)).await.unwrap();
        assert_eq!(bytes, "chunk1chunk2chunk3");
    }

    #[tokio::test]
    async fn rebuilt_body_is_byte_identical() {
        let original = "x".repeat(2048);
        let bytes = buffer_body(Body::from(original.clone())).await.unwrap();

        // The replacement body handed back to the caller.
        let rebuilt = Body::from(bytes.clone());
        let reread = rebuilt.collect().await.unwrap().to_bytes();
        assert_eq!(reread, original);
        assert_eq!(bytes, original);
    }

    #[tokio::test]
    async fn stream_failure_surfaces_as_error() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from("partial")),
            Err(BufferError::Stream("connection reset".into())),
        ]);
        let result = buffer_body(Body::from_stream(chunks)).await;
        assert!(matches!(result, Err(BufferError::Stream(_))));
    }

    #[tokio::test]
    async fn error_body_replays_the_failure() {
        let body = error_body(BufferError::Stream("connection reset".into()));
        let err = body.collect().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
