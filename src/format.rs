//! Log line assembly.
//!
//! Pure formatting over the per-call snapshots in [`crate::types`]. Every
//! section of a line is rendered in isolation: a header value that isn't
//! valid text, a charset that can't be resolved or a request body that isn't
//! JSON degrades its own section and nothing else.

use crate::status;
use crate::types::{RequestRecord, ResponseRecord};
use crate::DebugConfig;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use tracing::{debug, warn};

/// Placeholder rendered where a body is absent or empty.
const NO_BODY: &str = "[NONE]";

/// `[REQUEST] | METHOD: <m> | URL: <u>` plus optional header and body
/// sections.
pub(crate) fn request_line(record: &RequestRecord, config: &DebugConfig) -> String {
    let mut line = format!(
        "[REQUEST] | METHOD: {} | URL: {}",
        record.method, record.uri
    );

    if config.log_request_headers {
        line.push_str(&render_headers(&record.headers));
    }

    if config.log_request_body {
        line.push_str("\n| BODY: ");
        line.push_str(&render_request_body(record.body.as_ref()));
    }

    line
}

/// `[RESPONSE] | METHOD: <m> | URL: <u> | STATUS: <code> (<reason>) |
/// TIME: <ms> ms` plus echoed request fields, headers and body sections.
///
/// `record.body` is only populated when the outcome-applicable body flag is
/// set and the body was successfully buffered; its presence alone decides
/// whether a `BODY:` section appears.
pub(crate) fn response_line(record: &ResponseRecord, config: &DebugConfig) -> String {
    let mut line = format!(
        "[RESPONSE] | METHOD: {} | URL: {} | STATUS: {} ({}) | TIME: {} ms",
        record.method,
        record.uri,
        record.status.as_u16(),
        resolve_reason(record),
        record.elapsed.as_millis(),
    );

    if !config.echo_fields.is_empty() {
        line.push_str(&echoed_fields(record.request_body.as_ref(), &config.echo_fields));
    }

    if config.log_response_headers {
        line.push_str(&render_headers(&record.headers));
    }

    if let Some(body) = &record.body {
        line.push_str("\n| BODY: ");
        line.push_str(&render_response_body(body, record.headers.get(CONTENT_TYPE)));
    }

    line
}

/// `[ERROR] | METHOD: <m> | URL: <u> | EXCEPTION: <kind> | MESSAGE: <text>`.
pub(crate) fn error_line(method: &Method, uri: &Uri, kind: &str, message: &str) -> String {
    format!("[ERROR] | METHOD: {method} | URL: {uri} | EXCEPTION: {kind} | MESSAGE: {message}")
}

/// One `|   name: value` line per header, original order preserved.
/// Non-text header values are rendered lossily rather than dropped.
fn render_headers(headers: &HeaderMap) -> String {
    let mut out = String::new();
    for (name, value) in headers {
        out.push_str("\n|   ");
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
    }
    out
}

/// Request bodies originate in memory and are rendered as plain UTF-8 text.
fn render_request_body(body: Option<&Bytes>) -> String {
    match body {
        Some(bytes) if !bytes.is_empty() => String::from_utf8_lossy(bytes).into_owned(),
        _ => NO_BODY.to_owned(),
    }
}

/// `size: <n> bytes, content: <text>` for a buffered response body, decoded
/// with the charset declared in the content-type when one resolves.
fn render_response_body(bytes: &Bytes, content_type: Option<&HeaderValue>) -> String {
    let encoding = declared_encoding(content_type).unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    let content = if text.is_empty() { NO_BODY } else { &*text };
    format!("size: {} bytes, content: {}", bytes.len(), content)
}

/// Resolve the charset declared in a content-type header value.
///
/// An unknown label logs a warning and yields `None`, falling back to the
/// UTF-8 default at the call site.
fn declared_encoding(content_type: Option<&HeaderValue>) -> Option<&'static Encoding> {
    let raw = content_type?.to_str().ok()?;
    let label = charset_label(raw)?;
    let encoding = Encoding::for_label(label.as_bytes());
    if encoding.is_none() {
        warn!(
            charset = label,
            "could not decode response body charset, falling back to utf-8"
        );
    }
    encoding
}

/// Extract the `charset=` parameter from a content-type value, if any.
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// ` | name: value` for each configured field found in the request body.
///
/// The body is parsed as a flat JSON object. Missing keys are skipped; a
/// body that doesn't parse as an object disables the echo for this line
/// only, with a diagnostic on the internal log.
fn echoed_fields(request_body: Option<&Bytes>, fields: &[String]) -> String {
    let Some(body) = request_body else {
        debug!("field echo configured but no request body was captured");
        return String::new();
    };

    let text = String::from_utf8_lossy(body);
    let map: serde_json::Map<String, Value> = match serde_json::from_str(&text) {
        Ok(map) => map,
        Err(e) => {
            debug!(error = %e, "request body is not a flat JSON object, skipping field echo");
            return String::new();
        }
    };

    let mut out = String::new();
    for field in fields {
        if let Some(value) = map.get(field) {
            out.push_str(&format!(" | {}: {}", field, display_value(value)));
        }
    }
    out
}

/// JSON values as they should appear in a log line: strings without the
/// surrounding quotes, everything else in its JSON rendering.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Supplied reason text wins if non-blank, then the static table, then blank.
fn resolve_reason(record: &ResponseRecord) -> &str {
    match &record.reason {
        Some(reason) if !reason.trim().is_empty() => reason,
        _ => status::reason_phrase(record.status.as_u16()).unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestRecord, ResponseRecord};
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
    use std::time::Duration;

    fn request_record(body: Option<&str>) -> RequestRecord {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer X"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        RequestRecord {
            method: Method::GET,
            uri: Uri::from_static("https://api.example.com/items"),
            headers,
            body: body.map(|b| Bytes::copy_from_slice(b.as_bytes())),
        }
    }

    fn response_record(status: StatusCode, body: Option<&str>) -> ResponseRecord {
        ResponseRecord {
            method: Method::GET,
            uri: Uri::from_static("https://api.example.com/items"),
            status,
            reason: None,
            headers: HeaderMap::new(),
            body: body.map(|b| Bytes::copy_from_slice(b.as_bytes())),
            request_body: None,
            elapsed: Duration::from_millis(120),
        }
    }

    #[test]
    fn request_line_with_headers_and_body() {
        let record = request_record(Some(r#"{"q":1}"#));
        let line = request_line(&record, &DebugConfig::new());
        assert_eq!(
            line,
            "[REQUEST] | METHOD: GET | URL: https://api.example.com/items\
             \n|   authorization: Bearer X\
             \n|   accept: application/json\
             \n| BODY: {\"q\":1}"
        );
    }

    #[test]
    fn request_line_renders_placeholder_for_missing_body() {
        let record = request_record(None);
        let line = request_line(&record, &DebugConfig::new());
        assert!(line.ends_with("| BODY: [NONE]"));
    }

    #[test]
    fn request_line_respects_disabled_sections() {
        let config = DebugConfig::new()
            .log_request_headers(false)
            .log_request_body(false);
        let record = request_record(Some("ignored"));
        let line = request_line(&record, &config);
        assert_eq!(
            line,
            "[REQUEST] | METHOD: GET | URL: https://api.example.com/items"
        );
    }

    #[test]
    fn response_line_basic() {
        let record = response_record(StatusCode::OK, Some(r#"{"ok":true}"#));
        let line = response_line(&record, &DebugConfig::new());
        assert!(line.starts_with(
            "[RESPONSE] | METHOD: GET | URL: https://api.example.com/items \
             | STATUS: 200 (OK) | TIME: 120 ms"
        ));
        assert!(line.contains("| BODY: size: 11 bytes, content: {\"ok\":true}"));
    }

    #[test]
    fn supplied_reason_wins_over_table() {
        let mut record = response_record(StatusCode::OK, None);
        record.reason = Some("Completely Fine".into());
        let line = response_line(&record, &DebugConfig::new());
        assert!(line.contains("STATUS: 200 (Completely Fine)"));
    }

    #[test]
    fn blank_reason_falls_back_to_table() {
        let mut record = response_record(StatusCode::NOT_FOUND, None);
        record.reason = Some("".into());
        let line = response_line(&record, &DebugConfig::new());
        assert!(line.contains("STATUS: 404 (Not Found)"));
    }

    #[test]
    fn unknown_status_renders_blank_reason() {
        let record = response_record(StatusCode::from_u16(599).unwrap(), None);
        let line = response_line(&record, &DebugConfig::new());
        assert!(line.contains("STATUS: 599 ()"));
    }

    #[test]
    fn empty_body_reports_zero_size_and_placeholder() {
        let record = response_record(StatusCode::OK, Some(""));
        let line = response_line(&record, &DebugConfig::new());
        assert!(line.contains("| BODY: size: 0 bytes, content: [NONE]"));
    }

    #[test]
    fn absent_body_has_no_body_section() {
        let record = response_record(StatusCode::OK, None);
        let line = response_line(&record, &DebugConfig::new());
        assert!(!line.contains("BODY:"));
    }

    #[test]
    fn declared_charset_is_used_for_decoding() {
        // 0xE9 is "é" in latin-1 but invalid UTF-8.
        let bytes = Bytes::from_static(&[0xE9]);
        let content_type = HeaderValue::from_static("text/plain; charset=iso-8859-1");
        let rendered = render_response_body(&bytes, Some(&content_type));
        assert_eq!(rendered, "size: 1 bytes, content: é");
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        let bytes = Bytes::from_static(b"plain text");
        let content_type = HeaderValue::from_static("text/plain; charset=bogus-encoding");
        let rendered = render_response_body(&bytes, Some(&content_type));
        assert_eq!(rendered, "size: 10 bytes, content: plain text");
    }

    #[test]
    fn charset_label_parsing() {
        assert_eq!(
            charset_label("application/json; charset=utf-8"),
            Some("utf-8")
        );
        assert_eq!(
            charset_label("text/html; Charset=\"ISO-8859-1\""),
            Some("ISO-8859-1")
        );
        assert_eq!(charset_label("application/json"), None);
        assert_eq!(charset_label("text/plain; boundary=xyz"), None);
    }

    #[test]
    fn echoed_fields_appear_after_time() {
        let config = DebugConfig::new().echo_request_fields(["userId"]);
        let mut record = response_record(StatusCode::OK, None);
        record.request_body = Some(Bytes::from_static(br#"{"userId": 42, "name": "a"}"#));
        let line = response_line(&record, &config);
        assert_eq!(line.matches("| userId: 42").count(), 1);
        assert!(!line.contains("name: a"));
    }

    #[test]
    fn echoed_string_fields_render_without_quotes() {
        let config = DebugConfig::new().echo_request_fields(["method", "missing"]);
        let mut record = response_record(StatusCode::OK, None);
        record.request_body = Some(Bytes::from_static(br#"{"method": "getItems"}"#));
        let line = response_line(&record, &config);
        assert!(line.contains(" | method: getItems"));
        assert!(!line.contains("missing"));
    }

    #[test]
    fn non_object_body_disables_echo_without_blanking_line() {
        let config = DebugConfig::new().echo_request_fields(["userId"]);
        let mut record = response_record(StatusCode::OK, None);
        record.request_body = Some(Bytes::from_static(b"[1, 2, 3]"));
        let line = response_line(&record, &config);
        assert!(line.contains("STATUS: 200 (OK)"));
        assert!(!line.contains("userId"));
    }

    #[test]
    fn error_line_format() {
        let line = error_line(
            &Method::POST,
            &Uri::from_static("https://api.example.com/items"),
            "io::Error",
            "connection refused",
        );
        assert_eq!(
            line,
            "[ERROR] | METHOD: POST | URL: https://api.example.com/items \
             | EXCEPTION: io::Error | MESSAGE: connection refused"
        );
    }
}
