use crate::domain::model::Candidate;
use crate::domain::ports::MatchPolicy;

/// Byte-for-byte comparison of name, brand and model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl MatchPolicy for ExactMatch {
    fn matches(&self, predicted: &Candidate, truth: &Candidate) -> bool {
        predicted.name == truth.name
            && predicted.brand == truth.brand
            && predicted.model == truth.model
    }
}

/// Case-insensitive comparison with trimmed, collapsed whitespace.
///
/// A field left unset on the ground truth is not compared.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedMatch;

impl NormalizedMatch {
    fn fold(value: &str) -> String {
        value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    fn field_matches(predicted: &Option<String>, truth: &Option<String>) -> bool {
        match truth {
            None => true,
            Some(expected) => predicted
                .as_deref()
                .is_some_and(|p| Self::fold(p) == Self::fold(expected)),
        }
    }
}

impl MatchPolicy for NormalizedMatch {
    fn matches(&self, predicted: &Candidate, truth: &Candidate) -> bool {
        Self::fold(&predicted.name) == Self::fold(&truth.name)
            && Self::field_matches(&predicted.brand, &truth.brand)
            && Self::field_matches(&predicted.model, &truth.model)
    }
}
