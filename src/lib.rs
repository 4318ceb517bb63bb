pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{GeminiDirectBackend, PrimaryBackend, SearchLinkPricer};
pub use core::orchestrator::{AnalysisOrchestrator, DefaultOrchestrator};
pub use domain::model::{
    AnalysisFailure, AnalysisResult, Candidate, EnrichedCandidate, ImageReference, PriceInfo,
    Provenance,
};
pub use utils::error::{LensError, Result};
