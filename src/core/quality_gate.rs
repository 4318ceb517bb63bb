use crate::domain::model::Candidate;
use serde::Serialize;

pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub score: f64,
    pub passed: bool,
    pub threshold: f64,
    pub details: Vec<(String, bool)>,
}

/// Scores how complete a candidate is. Used for diagnostics only.
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    threshold: f64,
}

impl QualityGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn evaluate(&self, candidate: &Candidate) -> QualityReport {
        let mut score = 0.0;
        let mut details = Vec::with_capacity(5);

        let mut check = |field: &str, ok: bool, weight: f64| {
            if ok {
                score += weight;
            }
            details.push((field.to_string(), ok));
        };

        check("name", candidate.name.chars().count() > 3, 0.30);
        check("brand", has_text(&candidate.brand), 0.20);
        check("category", has_text(&candidate.category), 0.20);
        check(
            "description",
            candidate
                .description
                .as_deref()
                .is_some_and(|d| d.chars().count() > 5),
            0.15,
        );

        // 信心值分兩段給分
        let confidence_weight = if candidate.confidence >= 0.8 {
            0.15
        } else if candidate.confidence >= 0.6 {
            0.10
        } else {
            0.0
        };
        check("confidence", confidence_weight > 0.0, confidence_weight);

        let score = (score * 100.0).round() / 100.0;
        QualityReport {
            score,
            passed: score >= self.threshold,
            threshold: self.threshold,
            details,
        }
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_THRESHOLD)
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_candidate_passes() {
        let candidate = Candidate {
            name: "DeWalt DCD791".to_string(),
            brand: Some("DeWalt".to_string()),
            model: Some("DCD791".to_string()),
            category: Some("power tool".to_string()),
            tool_type: Some("drill".to_string()),
            confidence: 0.92,
            description: Some("20V brushless drill driver".to_string()),
            provider: None,
        };

        let report = QualityGate::default().evaluate(&candidate);
        assert_eq!(report.score, 1.0);
        assert!(report.passed);
    }

    #[test]
    fn test_bare_candidate_fails() {
        let report = QualityGate::default().evaluate(&Candidate::named("saw", 0.65));
        // name too short, only the mid confidence band scores
        assert_eq!(report.score, 0.1);
        assert!(!report.passed);
        assert_eq!(report.details.len(), 5);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut candidate = Candidate::named("Pipe wrench", 0.85);
        candidate.brand = Some("Ridgid".to_string());
        candidate.category = Some("hand tool".to_string());
        // 0.30 + 0.20 + 0.20 + 0.15
        let report = QualityGate::new(0.85).evaluate(&candidate);
        assert_eq!(report.score, 0.85);
        assert!(report.passed);
    }
}
