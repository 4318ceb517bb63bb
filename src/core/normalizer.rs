use crate::domain::model::Candidate;
use crate::utils::error::{LensError, Result};

/// Turns a backend's raw text answer into a candidate list.
pub trait ResponseNormalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> Result<Vec<Candidate>>;
}

/// Takes the span from the first `[` to the last `]` and parses it as JSON.
///
/// Surrounding commentary and code fences are ignored. Fields are taken as
/// given; missing optional fields stay unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketNormalizer;

impl BracketNormalizer {
    pub fn extract_array(raw: &str) -> Option<&str> {
        let start = raw.find('[')?;
        let end = raw.rfind(']')?;
        if end < start {
            return None;
        }
        Some(&raw[start..=end])
    }
}

impl ResponseNormalizer for BracketNormalizer {
    fn normalize(&self, raw: &str) -> Result<Vec<Candidate>> {
        let span = Self::extract_array(raw).ok_or_else(|| LensError::ParseError {
            message: "no JSON array found in model output".to_string(),
        })?;

        serde_json::from_str::<Vec<Candidate>>(span).map_err(|e| LensError::ParseError {
            message: format!("array is not a valid candidate list: {}", e),
        })
    }
}
