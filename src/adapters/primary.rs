use crate::domain::model::{Candidate, ImageReference, Provenance};
use crate::domain::ports::InferenceBackend;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND_NAME: &str = "primary";

#[derive(Serialize)]
struct AnalyzeUrlRequest<'a> {
    image_url: &'a str,
}

#[derive(Serialize)]
struct AnalyzeBase64Request<'a> {
    image_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<String>,
}

/// Internally hosted inference service.
///
/// `POST {endpoint}/analyze` takes `{ image_url }`, `POST {endpoint}/analyze-base64`
/// takes `{ image_base64 }`; both answer `{ success, candidates }`.
pub struct PrimaryBackend {
    endpoint: String,
    client: Client,
}

impl PrimaryBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn failure(message: impl Into<String>) -> LensError {
        LensError::BackendError {
            backend: BACKEND_NAME.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl InferenceBackend for PrimaryBackend {
    fn provenance(&self) -> Provenance {
        Provenance::Primary
    }

    async fn identify(&self, image: &ImageReference) -> Result<Vec<Candidate>> {
        let request = match image {
            ImageReference::Url(url) => self
                .client
                .post(format!("{}/analyze", self.endpoint))
                .json(&AnalyzeUrlRequest { image_url: url }),
            ImageReference::Base64(payload) => self
                .client
                .post(format!("{}/analyze-base64", self.endpoint))
                .json(&AnalyzeBase64Request {
                    image_base64: payload,
                }),
        };

        tracing::debug!("Calling primary inference service at {}", self.endpoint);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Primary response status: {}", status);

        if !status.is_success() {
            return Err(Self::failure(format!("HTTP status {}", status)));
        }

        let body = response.text().await?;
        let parsed: AnalyzeResponse = serde_json::from_str(&body)
            .map_err(|e| Self::failure(format!("malformed response body: {}", e)))?;

        match parsed {
            AnalyzeResponse {
                success: true,
                candidates: Some(candidates),
                ..
            } => Ok(candidates),
            AnalyzeResponse { error, .. } => Err(Self::failure(
                error.unwrap_or_else(|| "response has no successful candidate list".to_string()),
            )),
        }
    }
}
