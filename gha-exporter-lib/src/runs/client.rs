//! GitHub API client
//!
//! Minimal GitHub API client for listing workflow runs.

use crate::http::{USER_AGENT, error_body};
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "  upstream";

/// Remaining request budget below which every response is logged as a warning
const LOW_RATE_LIMIT_THRESHOLD: usize = 100;

/// Failure talking to the run source
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("GitHub API returned HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("could not reach the GitHub API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// HTTP status code of the failed response, if the request got that far
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode { .. } => None,
        }
    }
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new GitHub API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        } else {
            log::info!(target: LOG_TARGET, "No GitHub token configured, unauthenticated rate limits apply");
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL for this client, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET request and decode the JSON body.
    ///
    /// Any non-2xx response is reported as [`UpstreamError::Status`] with a snippet of the body.
    /// Nothing is retried here; the caller decides what a failure means.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, UpstreamError> {
        let resp = self.client.get(url).query(query).send().await?;

        let rate_limit = extract_rate_limit_from_headers(resp.headers());
        if let Some(rl) = rate_limit
            && rl.remaining < LOW_RATE_LIMIT_THRESHOLD
        {
            log::warn!(target: LOG_TARGET, "GitHub rate limit nearly exhausted: {} requests left until {}", rl.remaining, rl.reset_at);
        }

        let status = resp.status();
        let url = resp.url().to_string();

        if !status.is_success() {
            if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
                match rate_limit {
                    Some(rl) => log::warn!(target: LOG_TARGET, "GitHub API refused request (HTTP {status}), rate limit resets at {}", rl.reset_at),
                    None => log::warn!(target: LOG_TARGET, "GitHub API refused request (HTTP {status})"),
                }
            }

            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url,
                body: error_body(resp).await,
            });
        }

        resp.json().await.map_err(|source| UpstreamError::Decode { url, source })
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_extract_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        let rate_limit = extract_rate_limit_from_headers(&headers).unwrap();

        assert_eq!(rate_limit.remaining, 4999);
        assert_eq!(rate_limit.reset_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_extract_rate_limit_missing_headers() {
        let headers = HeaderMap::new();
        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_extract_rate_limit_invalid_remaining() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("invalid"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_client_base_url_trims_trailing_slash() {
        let client = Client::new(None, "https://api.github.com/", TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_client_new_with_token() {
        let client = Client::new(Some("test_token"), "https://api.github.com", TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_token_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things"))
            .and(query_param("page", "2"))
            .and(header("authorization", "Bearer secret"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(Some("secret"), server.uri(), TIMEOUT).unwrap();
        let url = format!("{}/things", client.base_url());
        let value: Value = client.get_json(&url, &[("page", "2".to_string())]).await.unwrap();

        assert_eq!(value["ok"], Value::Bool(true));
    }

    #[tokio::test]
    async fn test_get_json_non_success_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string("API rate limit exceeded")
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1704067200"),
            )
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), TIMEOUT).unwrap();
        let url = format!("{}/things", client.base_url());
        let err = client.get_json::<Value>(&url, &[]).await.unwrap_err();

        assert_eq!(err.status(), Some(403));
        let msg = err.to_string();
        assert!(msg.contains("403"), "{msg}");
        assert!(msg.contains("API rate limit exceeded"), "{msg}");
    }

    #[tokio::test]
    async fn test_get_json_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), TIMEOUT).unwrap();
        let url = format!("{}/things", client.base_url());
        let err = client.get_json::<Value>(&url, &[]).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Decode { .. }));
        assert_eq!(err.status(), None);
    }
}
