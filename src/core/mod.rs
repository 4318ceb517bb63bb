pub mod matching;
pub mod normalizer;
pub mod orchestrator;
pub mod prompt;
pub mod quality_gate;

pub use crate::domain::model::{
    AnalysisFailure, AnalysisResult, Candidate, EnrichedCandidate, ImageReference, PriceInfo,
    Provenance,
};
pub use crate::domain::ports::{ConfigProvider, InferenceBackend, MatchPolicy, PriceEnricher};
pub use crate::utils::error::Result;
