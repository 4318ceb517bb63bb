use crate::config::*;
use crate::core::quality_gate::DEFAULT_QUALITY_THRESHOLD;
use crate::domain::model::{Candidate, ImageReference};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{LensError, Result};
use crate::utils::validation::Validate;
use base64::{engine::general_purpose, Engine};
use clap::{ArgGroup, Parser};
use std::path::Path;
use std::time::Duration;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Clone, Parser)]
#[command(name = "gonggu-lens")]
#[command(about = "Identify a tool from a photo and list priced candidates")]
#[command(group(ArgGroup::new("image").required(true).args(["url", "base64", "image_file"])))]
pub struct CliConfig {
    /// Image URL, absolute or relative to the public base URL
    #[arg(long)]
    pub url: Option<String>,

    /// Inline base64 image, optionally with a data URL prefix
    #[arg(long)]
    pub base64: Option<String>,

    /// Local image file to send inline
    #[arg(long)]
    pub image_file: Option<String>,

    /// TOML config file; replaces the service flags below
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, env = "AI_SERVER_URL", default_value = DEFAULT_PRIMARY_ENDPOINT)]
    pub primary_endpoint: String,

    #[arg(long, env = "PUBLIC_BASE_URL", default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_GEMINI_API_BASE)]
    pub gemini_api_base: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, default_value = DEFAULT_PRICE_STORE)]
    pub price_store: String,

    #[arg(long, default_value = DEFAULT_PRICE_SEARCH_URL)]
    pub price_search_url: String,

    #[arg(long, default_value_t = DEFAULT_MIN_PRICE)]
    pub min_price: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
    pub max_price: u64,

    #[arg(long, default_value_t = DEFAULT_QUALITY_THRESHOLD)]
    pub quality_threshold: f64,

    /// Expected name of the tool, to check the top candidate
    #[arg(long)]
    pub expect_name: Option<String>,

    #[arg(long, requires = "expect_name")]
    pub expect_brand: Option<String>,

    #[arg(long, requires = "expect_name")]
    pub expect_model: Option<String>,

    #[arg(long, help = "Print the quality report of the top candidate")]
    pub explain: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log per-stage timings")]
    pub monitor: bool,
}

impl CliConfig {
    /// 依參數決定圖片來源；本地檔案讀取後轉成 data URL 形式的 base64
    pub async fn image_reference(&self) -> Result<ImageReference> {
        if let Some(url) = &self.url {
            return Ok(ImageReference::Url(url.clone()));
        }
        if let Some(payload) = &self.base64 {
            return Ok(ImageReference::Base64(payload.clone()));
        }
        if let Some(path) = &self.image_file {
            return load_image_file(path).await;
        }
        Err(LensError::InvalidImageError {
            message: "one of --url, --base64 or --image-file is required".to_string(),
        })
    }

    /// 圖片參數的檢查；使用 TOML 設定時服務參數被取代，但這部分仍需驗證
    pub fn validate_image_args(&self) -> Result<()> {
        use crate::utils::validation::*;

        if let Some(url) = &self.url {
            validate_non_empty_string("url", url)?;
        }
        if let Some(payload) = &self.base64 {
            validate_non_empty_string("base64", payload)?;
        }
        if let Some(path) = &self.image_file {
            validate_file_extensions("image_file", std::slice::from_ref(path), &IMAGE_EXTENSIONS)?;
        }
        Ok(())
    }

    pub fn expected(&self) -> Option<Candidate> {
        self.expect_name.as_ref().map(|name| {
            let mut truth = Candidate::named(name, 1.0);
            truth.brand = self.expect_brand.clone();
            truth.model = self.expect_model.clone();
            truth
        })
    }
}

pub async fn load_image_file(path: &str) -> Result<ImageReference> {
    let data = tokio::fs::read(path).await?;
    if data.is_empty() {
        return Err(LensError::InvalidImageError {
            message: format!("{} is empty", path),
        });
    }

    let mime_type = match Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    };

    Ok(ImageReference::Base64(format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(&data)
    )))
}

impl ConfigProvider for CliConfig {
    fn primary_endpoint(&self) -> &str {
        &self.primary_endpoint
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    fn gemini_api_key(&self) -> Option<&str> {
        resolved_secret(self.gemini_api_key.as_deref())
    }

    fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    fn gemini_api_base(&self) -> &str {
        &self.gemini_api_base
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn price_store(&self) -> &str {
        &self.price_store
    }

    fn price_search_url(&self) -> &str {
        &self.price_search_url
    }

    fn price_range(&self) -> (u64, u64) {
        (self.min_price, self.max_price)
    }

    fn quality_threshold(&self) -> f64 {
        self.quality_threshold
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("primary_endpoint", &self.primary_endpoint)?;
        validate_url("public_base_url", &self.public_base_url)?;
        validate_url("gemini_api_base", &self.gemini_api_base)?;
        validate_url("price_search_url", &self.price_search_url)?;
        validate_non_empty_string("gemini_model", &self.gemini_model)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        validate_ordered_pair("min_price", self.min_price, self.max_price)?;
        validate_range("quality_threshold", self.quality_threshold, 0.0, 1.0)?;

        self.validate_image_args()
    }
}
