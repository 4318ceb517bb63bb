//! Direct call to the Gemini `generateContent` API.
//!
//! Used as the fallback path: the image is sent inline with the fixed
//! identification prompt and the free-text answer is normalized into
//! candidates.

use crate::core::normalizer::{BracketNormalizer, ResponseNormalizer};
use crate::core::prompt::build_identification_prompt;
use crate::domain::model::{Candidate, ImageReference, InlineImage, Provenance, DEFAULT_MIME_TYPE};
use crate::domain::ports::InferenceBackend;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const BACKEND_NAME: &str = "gemini";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

// untagged: variant order matters when decoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

pub struct GeminiDirectBackend {
    api_key: String,
    model: String,
    api_base: String,
    client: Client,
    normalizer: Arc<dyn ResponseNormalizer>,
}

impl GeminiDirectBackend {
    pub fn new(api_key: &str, model: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LensError::MissingConfigError {
                field: "gemini.api_key".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
            normalizer: Arc::new(BracketNormalizer),
        })
    }

    /// Swaps the text-to-candidates step, e.g. for a structured-output mode.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn ResponseNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn failure(message: impl Into<String>) -> LensError {
        LensError::BackendError {
            backend: BACKEND_NAME.to_string(),
            message: message.into(),
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<InlineImage> {
        tracing::debug!("Fetching source image from {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LensError::BackendError {
                backend: "image-fetch".to_string(),
                message: format!("HTTP status {} for {}", status, url),
            });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(LensError::InvalidImageError {
                message: format!("image at {} is empty", url),
            });
        }
        tracing::debug!("Fetched {} bytes ({})", bytes.len(), mime_type);

        Ok(InlineImage {
            mime_type,
            data: general_purpose::STANDARD.encode(&bytes),
        })
    }

    async fn generate(&self, image: InlineImage) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: build_identification_prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type,
                            data: image.data,
                        },
                    },
                ],
            }],
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model);
        tracing::debug!("Calling Gemini model {}", self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            // URL 帶有 API key，不可出現在錯誤訊息中
            .map_err(|e| LensError::ApiError(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            tracing::debug!("Gemini error body: {}", excerpt);
            return Err(Self::failure(format!("HTTP status {}", status)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LensError::ApiError(e.without_url()))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| match part {
                        Part::Text { text } => Some(text),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Self::failure("response contained no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl InferenceBackend for GeminiDirectBackend {
    fn provenance(&self) -> Provenance {
        Provenance::GeminiDirect
    }

    async fn identify(&self, image: &ImageReference) -> Result<Vec<Candidate>> {
        let inline = match image {
            ImageReference::Url(url) => self.fetch_image(url).await?,
            ImageReference::Base64(payload) => InlineImage::from_base64_payload(payload),
        };

        let text = self.generate(inline).await?;
        let mut candidates = self.normalizer.normalize(&text)?;

        for candidate in &mut candidates {
            candidate.provider = Some(Provenance::GeminiDirect.as_str().to_string());
        }
        Ok(candidates)
    }
}
