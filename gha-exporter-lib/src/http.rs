//! Small helpers shared by the upstream client and the ingestion sink.

/// User agent sent with every outbound request
pub const USER_AGENT: &str = concat!("gha-exporter/", env!("CARGO_PKG_VERSION"));

/// Maximum number of characters of a response body carried in error messages
const BODY_SNIPPET_CHARS: usize = 512;

/// Trim a response body down to something that fits in a log line.
pub fn snippet(body: &str) -> String {
    let body = body.trim();
    let mut chars = body.chars();
    let mut out: String = chars.by_ref().take(BODY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}

/// Read the body of a failed response, falling back to an empty string if it cannot be read.
pub async fn error_body(resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(text) => snippet(&text),
        Err(e) => format!("<unreadable body: {e}>"),
    }
}
