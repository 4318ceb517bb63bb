use crate::domain::model::PriceInfo;
use crate::domain::ports::PriceEnricher;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use url::Url;

/// Placeholder price policy: an estimate derived from the name plus a search
/// link on the configured price-comparison site.
///
/// Same name, same estimate. Replace with a real lookup behind `PriceEnricher`.
#[derive(Debug, Clone)]
pub struct SearchLinkPricer {
    store: String,
    search_url: String,
    min_price: u64,
    max_price: u64,
}

impl SearchLinkPricer {
    pub fn new(store: &str, search_url: &str, price_range: (u64, u64)) -> Self {
        Self {
            store: store.to_string(),
            search_url: search_url.to_string(),
            min_price: price_range.0,
            max_price: price_range.1,
        }
    }

    fn estimate(&self, name: &str) -> i64 {
        let ceiling = i64::MAX as u64;
        let min = self.min_price.min(ceiling);
        let max = self.max_price.min(ceiling);
        let span = max.saturating_sub(min).max(1);

        let mut hasher = DefaultHasher::new();
        name.trim().to_lowercase().hash(&mut hasher);
        let raw = min.saturating_add(hasher.finish() % span).min(max.max(min));

        // 以千元為單位取整，但不得低於下限
        let rounded = (raw / 1000 * 1000).max(min);
        i64::try_from(rounded).unwrap_or(i64::MAX)
    }

    fn search_link(&self, name: &str) -> Result<String> {
        let mut url = Url::parse(&self.search_url).map_err(|e| LensError::EnrichmentError {
            message: format!("invalid search URL '{}': {}", self.search_url, e),
        })?;
        url.query_pairs_mut().append_pair("query", name);
        Ok(url.to_string())
    }
}

#[async_trait]
impl PriceEnricher for SearchLinkPricer {
    async fn enrich(&self, name: &str) -> Result<PriceInfo> {
        if name.trim().is_empty() {
            return Err(LensError::EnrichmentError {
                message: "candidate has no name".to_string(),
            });
        }

        Ok(PriceInfo {
            price: Some(self.estimate(name)),
            store: Some(self.store.clone()),
            url: Some(self.search_link(name)?),
        })
    }
}
