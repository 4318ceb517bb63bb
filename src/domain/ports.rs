use crate::domain::model::{Candidate, ImageReference, PriceInfo, Provenance};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn primary_endpoint(&self) -> &str;
    fn public_base_url(&self) -> &str;
    fn gemini_api_key(&self) -> Option<&str>;
    fn gemini_model(&self) -> &str;
    fn gemini_api_base(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn price_store(&self) -> &str;
    fn price_search_url(&self) -> &str;
    fn price_range(&self) -> (u64, u64);
    fn quality_threshold(&self) -> f64;
}

/// An inference backend that turns an (absolute) image reference into candidates.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn provenance(&self) -> Provenance;

    async fn identify(&self, image: &ImageReference) -> Result<Vec<Candidate>>;
}

/// Best-effort market price lookup keyed by candidate display name.
#[async_trait]
pub trait PriceEnricher: Send + Sync {
    async fn enrich(&self, name: &str) -> Result<PriceInfo>;
}

/// Decides whether a predicted identification counts as correct.
pub trait MatchPolicy: Send + Sync {
    fn matches(&self, predicted: &Candidate, truth: &Candidate) -> bool;
}
