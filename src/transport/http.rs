//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::BatonError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// One meaningful SSE line.
#[derive(Debug, PartialEq, Eq)]
pub enum SseFrame<'a> {
    Data(&'a str),
    Done,
}

/// Parse an SSE line. Comments, blank lines and non-data fields yield `None`.
pub fn parse_sse_line(line: &str) -> Option<SseFrame<'_>> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(SseFrame::Done);
    }
    Some(SseFrame::Data(data))
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> BatonError {
    match status {
        401 | 403 => BatonError::Authentication(body.to_string()),
        429 => BatonError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => BatonError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_and_done_frames() {
        assert_eq!(parse_sse_line("data: {\"a\":1}"), Some(SseFrame::Data("{\"a\":1}")));
        assert_eq!(parse_sse_line("data:{}"), Some(SseFrame::Data("{}")));
        assert_eq!(parse_sse_line("data: [DONE]"), Some(SseFrame::Done));
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line("event: message"), None);
        assert_eq!(parse_sse_line("data: "), None);
    }

    #[test]
    fn maps_statuses() {
        assert!(matches!(status_to_error(401, "no"), BatonError::Authentication(_)));
        assert!(matches!(
            status_to_error(429, r#"{"error":{"retry_after":1.5}}"#),
            BatonError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
        assert!(matches!(
            status_to_error(500, "oops"),
            BatonError::Api { status: 500, .. }
        ));
    }
}
