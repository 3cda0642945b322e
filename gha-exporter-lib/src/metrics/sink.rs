//! Delivery of encoded samples to a VictoriaMetrics-compatible import endpoint.

use super::{MetricSample, encode};
use crate::http::{USER_AGENT, error_body};
use crate::settings::Settings;
use ohno::app_err;
use reqwest::header::CONTENT_TYPE;

const LOG_TARGET: &str = "      sink";

/// Path appended to the ingestion base URL
const IMPORT_PATH: &str = "/api/v1/import/prometheus";

/// Content type of the pushed payload
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text";

/// Failure delivering samples to the ingestion endpoint
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("ingestion endpoint {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("could not reach the ingestion endpoint: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A destination for metric samples
pub trait MetricSink {
    /// Deliver `samples` in a single request.
    ///
    /// An empty slice is a no-op. Failures are not retried.
    fn push(&self, samples: &[MetricSample]) -> impl Future<Output = Result<(), PushError>> + Send;
}

/// [`MetricSink`] posting Prometheus text to `{base}/api/v1/import/prometheus`
#[derive(Debug, Clone)]
pub struct VictoriaMetricsSink {
    client: reqwest::Client,
    import_url: String,
}

impl VictoriaMetricsSink {
    /// Build a sink from the configured ingestion URL.
    ///
    /// Fails if no ingestion URL is configured.
    pub fn new(settings: &Settings) -> crate::Result<Self> {
        let Some(base) = &settings.ingest_url else {
            return Err(app_err!("VM_URL is not set; pass --vm-url or set the VM_URL environment variable"));
        };

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.push_timeout)
            .build()?;

        Ok(Self {
            client,
            import_url: format!("{}{IMPORT_PATH}", base.as_str().trim_end_matches('/')),
        })
    }

    #[must_use]
    pub fn import_url(&self) -> &str {
        &self.import_url
    }
}

impl MetricSink for VictoriaMetricsSink {
    async fn push(&self, samples: &[MetricSample]) -> Result<(), PushError> {
        if samples.is_empty() {
            return Ok(());
        }

        let payload = encode(samples);
        log::debug!(target: LOG_TARGET, "Pushing {} sample(s) to {}:\n{payload}", samples.len(), self.import_url);

        let resp = self
            .client
            .post(&self.import_url)
            .header(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PushError::Status {
                url: self.import_url.clone(),
                status: status.as_u16(),
                body: error_body(resp).await,
            });
        }

        Ok(())
    }
}
