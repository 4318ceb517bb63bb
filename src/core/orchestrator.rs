use crate::adapters::{GeminiDirectBackend, PrimaryBackend, SearchLinkPricer};
use crate::core::quality_gate::QualityGate;
use crate::domain::model::{AnalysisResult, Candidate, EnrichedCandidate, ImageReference, Provenance};
use crate::domain::ports::{ConfigProvider, InferenceBackend, PriceEnricher};
use crate::utils::error::{LensError, Result};
use crate::utils::monitor::StageMonitor;
use futures_util::future::join_all;
use std::time::Instant;

/// Primary → direct fallback → price enrichment.
///
/// The primary backend is an optimization only: any failure there falls
/// through to the direct backend without reaching the caller. Dropping the
/// returned future aborts whichever HTTP call is in flight.
pub struct AnalysisOrchestrator<P, S, E>
where
    P: InferenceBackend,
    S: InferenceBackend,
    E: PriceEnricher,
{
    primary: P,
    secondary: Option<S>,
    enricher: E,
    public_base_url: String,
    quality_gate: QualityGate,
    monitor: StageMonitor,
}

pub type DefaultOrchestrator =
    AnalysisOrchestrator<PrimaryBackend, GeminiDirectBackend, SearchLinkPricer>;

impl<P, S, E> AnalysisOrchestrator<P, S, E>
where
    P: InferenceBackend,
    S: InferenceBackend,
    E: PriceEnricher,
{
    /// `secondary` is `None` when no direct-backend credential is configured.
    pub fn new(primary: P, secondary: Option<S>, enricher: E, public_base_url: &str) -> Self {
        Self {
            primary,
            secondary,
            enricher,
            public_base_url: public_base_url.to_string(),
            quality_gate: QualityGate::default(),
            monitor: StageMonitor::default(),
        }
    }

    pub fn with_quality_gate(mut self, quality_gate: QualityGate) -> Self {
        self.quality_gate = quality_gate;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = StageMonitor::new(enabled);
        self
    }

    pub fn monitor(&self) -> &StageMonitor {
        &self.monitor
    }

    pub async fn analyze_image(&self, url: &str) -> Result<AnalysisResult> {
        self.analyze(ImageReference::Url(url.to_string())).await
    }

    pub async fn analyze_image_base64(&self, payload: &str) -> Result<AnalysisResult> {
        self.analyze(ImageReference::Base64(payload.to_string())).await
    }

    pub async fn analyze(&self, image: ImageReference) -> Result<AnalysisResult> {
        tracing::info!("🔍 Analysis requested: {}", image.describe());
        let image = image.absolutize(&self.public_base_url)?;

        let started = Instant::now();
        match self.primary.identify(&image).await {
            Ok(candidates) => {
                self.monitor.record("primary", started);
                tracing::info!(
                    "✅ Primary backend answered with {} candidates",
                    candidates.len()
                );
                return Ok(self.finish(candidates, self.primary.provenance()).await);
            }
            Err(e) => {
                self.monitor.record("primary", started);
                tracing::warn!(
                    "Primary backend failed ({:?}), falling back to direct Gemini API",
                    e
                );
            }
        }

        let secondary = self.secondary.as_ref().ok_or_else(|| {
            tracing::error!("❌ No Gemini API key configured, fallback unavailable");
            LensError::MissingConfigError {
                field: "gemini.api_key".to_string(),
            }
        })?;

        let started = Instant::now();
        let candidates = secondary.identify(&image).await.map_err(|e| {
            tracing::error!("❌ Direct backend failed: {:?}", e);
            LensError::AnalysisFailed {
                message: e.to_string(),
            }
        })?;
        self.monitor.record("direct", started);
        tracing::info!(
            "✅ Direct backend ({}) answered with {} candidates",
            secondary.provenance().as_str(),
            candidates.len()
        );

        Ok(self.finish(candidates, secondary.provenance()).await)
    }

    async fn finish(&self, candidates: Vec<Candidate>, provenance: Provenance) -> AnalysisResult {
        let candidates = sanitize(candidates);

        if let Some(top) = candidates.first() {
            let report = self.quality_gate.evaluate(top);
            tracing::info!(
                "📊 Top candidate '{}' quality {:.2} / {} ({})",
                top.name,
                report.score,
                report.threshold,
                if report.passed { "pass" } else { "low" }
            );
        }

        let started = Instant::now();
        let enriched = self.enrich_all(candidates).await;
        self.monitor.record("enrichment", started);
        self.monitor.log_final_stats();

        AnalysisResult {
            success: true,
            candidates: enriched,
            provenance,
        }
    }

    /// Enriches every candidate concurrently; a failure degrades only that candidate.
    async fn enrich_all(&self, candidates: Vec<Candidate>) -> Vec<EnrichedCandidate> {
        join_all(candidates.into_iter().map(|candidate| async move {
            match self.enricher.enrich(&candidate.name).await {
                Ok(pricing) => EnrichedCandidate::new(candidate, pricing),
                Err(e) => {
                    tracing::warn!("Price enrichment failed for '{}': {}", candidate.name, e);
                    EnrichedCandidate::unpriced(candidate)
                }
            }
        }))
        .await
    }
}

impl DefaultOrchestrator {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let timeout = config.request_timeout();
        let primary = PrimaryBackend::new(config.primary_endpoint(), timeout)?;

        let secondary = match config.gemini_api_key() {
            Some(key) if !key.trim().is_empty() => Some(GeminiDirectBackend::new(
                key,
                config.gemini_model(),
                config.gemini_api_base(),
                timeout,
            )?),
            _ => {
                tracing::warn!("GEMINI_API_KEY not configured, direct fallback disabled");
                None
            }
        };

        let enricher = SearchLinkPricer::new(
            config.price_store(),
            config.price_search_url(),
            config.price_range(),
        );

        Ok(Self::new(primary, secondary, enricher, config.public_base_url())
            .with_quality_gate(QualityGate::new(config.quality_threshold())))
    }
}

/// Clamps confidences into [0, 1] and orders candidates by confidence, highest first.
pub fn sanitize(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    for candidate in &mut candidates {
        candidate.clamp_confidence();
    }
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_and_orders() {
        let candidates = vec![
            Candidate::named("low", -0.2),
            Candidate::named("high", 1.4),
            Candidate::named("mid", 0.5),
        ];

        let sanitized = sanitize(candidates);
        let names: Vec<&str> = sanitized.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
        assert_eq!(sanitized[0].confidence, 1.0);
        assert_eq!(sanitized[2].confidence, 0.0);
    }

    #[test]
    fn test_sanitize_keeps_order_of_ties() {
        let sanitized = sanitize(vec![
            Candidate::named("first", 0.5),
            Candidate::named("second", 0.5),
        ]);
        assert_eq!(sanitized[0].name, "first");
        assert_eq!(sanitized[1].name, "second");
    }
}
