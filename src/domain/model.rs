use crate::utils::error::{LensError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use url::Url;

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

static DATA_URL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(image/[\w.+-]+);base64,").expect("data URL pattern is valid")
});

/// Where the photo comes from. Exactly one representation per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    Url(String),
    Base64(String),
}

impl ImageReference {
    /// 將相對路徑 (/uploads/...) 轉為絕對 URL，base64 原樣返回
    pub fn absolutize(&self, public_base_url: &str) -> Result<Self> {
        match self {
            ImageReference::Base64(_) => Ok(self.clone()),
            ImageReference::Url(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(LensError::InvalidImageError {
                        message: "image URL is empty".to_string(),
                    });
                }

                // 只有 http(s) 視為絕對 URL；`localhost:4000/a.jpg` 之類仍當作相對路徑
                let mut relative = trimmed.to_string();
                if let Ok(url) = Url::parse(trimmed) {
                    if matches!(url.scheme(), "http" | "https") {
                        return Ok(ImageReference::Url(url.to_string()));
                    }
                    if trimmed.contains("://") {
                        return Err(LensError::InvalidImageError {
                            message: format!("unsupported URL scheme: {}", url.scheme()),
                        });
                    }
                    relative = format!("./{}", trimmed);
                }

                let base = Url::parse(public_base_url).map_err(|e| {
                    LensError::InvalidConfigValueError {
                        field: "public_base_url".to_string(),
                        value: public_base_url.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                let joined = base
                    .join(&relative)
                    .map_err(|e| LensError::InvalidImageError {
                        message: format!("cannot resolve '{}': {}", trimmed, e),
                    })?;
                Ok(ImageReference::Url(joined.to_string()))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ImageReference::Url(url) => url.clone(),
            ImageReference::Base64(data) => format!("<base64 payload, {} chars>", data.len()),
        }
    }
}

/// Inline image bytes ready for a generative backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Strips an optional `data:image/...;base64,` prefix, keeping its MIME type.
    pub fn from_base64_payload(payload: &str) -> Self {
        let payload = payload.trim();
        match DATA_URL_PREFIX.captures(payload) {
            Some(caps) => {
                let prefix_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
                Self {
                    mime_type: caps[1].to_string(),
                    data: payload[prefix_len..].to_string(),
                }
            }
            None => Self {
                mime_type: DEFAULT_MIME_TYPE.to_string(),
                data: payload.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConfidence {
    Number(f64),
    Text(String),
}

// 模型偶爾回傳 null 或 "0.9"；無法解析時視為 0，範圍由 sanitize 處理
fn lenient_confidence<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawConfidence>::deserialize(deserializer)? {
        Some(RawConfidence::Number(value)) => value,
        Some(RawConfidence::Text(text)) => text.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

impl Candidate {
    pub fn named(name: &str, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            brand: None,
            model: None,
            category: None,
            tool_type: None,
            confidence,
            description: None,
            provider: None,
        }
    }

    /// 信心值限制在 [0, 1]，非有限值視為 0
    pub fn clamp_confidence(&mut self) {
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PriceInfo {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.store.is_none() && self.url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    #[serde(flatten)]
    pub pricing: PriceInfo,
}

impl EnrichedCandidate {
    pub fn new(candidate: Candidate, pricing: PriceInfo) -> Self {
        Self { candidate, pricing }
    }

    pub fn unpriced(candidate: Candidate) -> Self {
        Self::new(candidate, PriceInfo::default())
    }
}

/// Which backend produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Primary,
    GeminiDirect,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Primary => "primary",
            Provenance::GeminiDirect => "gemini-direct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub candidates: Vec<EnrichedCandidate>,
    #[serde(skip)]
    pub provenance: Provenance,
}

impl AnalysisResult {
    pub fn top(&self) -> Option<&EnrichedCandidate> {
        self.candidates.first()
    }
}

/// Body returned to callers when the whole analysis fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl AnalysisFailure {
    pub fn from_error(err: &LensError) -> Self {
        Self {
            success: false,
            error: err.user_friendly_message(),
            message: "analysis failed".to_string(),
        }
    }
}
