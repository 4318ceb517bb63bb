use crate::config::*;
use crate::core::quality_gate::DEFAULT_QUALITY_THRESHOLD;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LensError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub primary: PrimaryConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub quality: Option<QualityConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub public_base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryConfig {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    pub store: Option<String>,
    pub search_url: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LensError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LensError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LensError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("primary.endpoint", self.primary_endpoint())?;
        validate_url("service.public_base_url", self.public_base_url())?;
        validate_url("gemini.api_base", self.gemini_api_base())?;
        validate_url("pricing.search_url", self.price_search_url())?;
        validate_non_empty_string("gemini.model", self.gemini_model())?;
        validate_non_empty_string("pricing.store", self.price_store())?;
        validate_positive_number("service.timeout_seconds", self.request_timeout().as_secs(), 1)?;

        let (min, max) = self.price_range();
        validate_ordered_pair("pricing.min_price", min, max)?;
        validate_range("quality.threshold", self.quality_threshold(), 0.0, 1.0)?;

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_json)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn primary_endpoint(&self) -> &str {
        self.primary
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_PRIMARY_ENDPOINT)
    }

    fn public_base_url(&self) -> &str {
        self.service
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL)
    }

    fn gemini_api_key(&self) -> Option<&str> {
        resolved_secret(self.gemini.api_key.as_deref())
    }

    fn gemini_model(&self) -> &str {
        self.gemini.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    fn gemini_api_base(&self) -> &str {
        self.gemini
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_API_BASE)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.service
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    fn price_store(&self) -> &str {
        self.pricing.store.as_deref().unwrap_or(DEFAULT_PRICE_STORE)
    }

    fn price_search_url(&self) -> &str {
        self.pricing
            .search_url
            .as_deref()
            .unwrap_or(DEFAULT_PRICE_SEARCH_URL)
    }

    fn price_range(&self) -> (u64, u64) {
        (
            self.pricing.min_price.unwrap_or(DEFAULT_MIN_PRICE),
            self.pricing.max_price.unwrap_or(DEFAULT_MAX_PRICE),
        )
    }

    fn quality_threshold(&self) -> f64 {
        self.quality
            .as_ref()
            .map(|q| q.threshold)
            .unwrap_or(DEFAULT_QUALITY_THRESHOLD)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
