#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_PRIMARY_ENDPOINT: &str = "http://localhost:4001";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_PRICE_STORE: &str = "Danawa";
pub const DEFAULT_PRICE_SEARCH_URL: &str = "https://www.danawa.com/search/";
pub const DEFAULT_MIN_PRICE: u64 = 50_000;
pub const DEFAULT_MAX_PRICE: u64 = 250_000;

/// 空字串或未替換的 `${VAR}` 都視為未設定
pub(crate) fn resolved_secret(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
}
