use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{SubmissionPort, SubmissionReceipt};
use crate::app::registration_use_case::RegistrationSubmission;
use crate::config::{GeocoderConfig, SubmissionConfig};
use crate::error::{RegistrationError, Result};
use crate::infra::http_client::build_client;

/// Posts the finished registration record as JSON to the registration API.
pub struct HttpSubmissionSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSubmissionSink {
    pub fn new(config: &SubmissionConfig, geocoder: &GeocoderConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&geocoder.user_agent, config.timeout_seconds)?,
            url: config.url.clone(),
        })
    }
}

/// Error text from a rejected submission: the body's `message`, else the status.
pub fn rejection_message(status: u16, body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("registration API returned status {status}"))
}

/// Parse the response body as JSON. Empty or non-JSON bodies become `Null`.
pub fn response_body(status: u16, text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|e| {
        debug!(status, len = text.len(), "Response body is not JSON: {}", e);
        Value::Null
    })
}

#[async_trait]
impl SubmissionPort for HttpSubmissionSink {
    #[instrument(skip(self, submission), fields(url = %self.url, name = %submission.name))]
    async fn submit(&self, submission: &RegistrationSubmission) -> Result<SubmissionReceipt> {
        let response = self.client.post(&self.url).json(submission).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = response_body(status, &text);

        if !(200..300).contains(&status) {
            let message = rejection_message(status, &body);
            warn!(status, %message, "Registration rejected");
            return Err(RegistrationError::Api { message });
        }

        info!(status, "Registration accepted");
        Ok(SubmissionReceipt { status, body })
    }
}
