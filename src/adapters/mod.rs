// Adapters layer: concrete implementations of the domain ports over HTTP.

pub mod gemini;
pub mod pricing;
pub mod primary;

pub use gemini::GeminiDirectBackend;
pub use pricing::SearchLinkPricer;
pub use primary::PrimaryBackend;
