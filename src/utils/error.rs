use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Inference backend call failed: {message}")]
    BackendError { backend: String, message: String },

    #[error("Failed to parse AI response: {message}")]
    ParseError { message: String },

    #[error("AI analysis failed: {message}")]
    AnalysisFailed { message: String },

    #[error("Price enrichment failed: {message}")]
    EnrichmentError { message: String },

    #[error("Invalid image reference: {message}")]
    InvalidImageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Parsing,
    Analysis,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LensError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LensError::ApiError(_) | LensError::BackendError { .. } => ErrorCategory::Network,
            LensError::MissingConfigError { .. }
            | LensError::InvalidConfigValueError { .. }
            | LensError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LensError::SerializationError(_) | LensError::ParseError { .. } => {
                ErrorCategory::Parsing
            }
            LensError::AnalysisFailed { .. } | LensError::EnrichmentError { .. } => {
                ErrorCategory::Analysis
            }
            LensError::IoError(_) | LensError::InvalidImageError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LensError::EnrichmentError { .. } => ErrorSeverity::Low,
            LensError::ApiError(_) | LensError::BackendError { .. } => ErrorSeverity::Medium,
            LensError::MissingConfigError { .. }
            | LensError::InvalidConfigValueError { .. }
            | LensError::ConfigValidationError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 是否為設定錯誤 (沒有任何後備路徑可用)
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LensError::MissingConfigError { field } => {
                format!("Set '{}' in the config file or environment", field)
            }
            LensError::InvalidConfigValueError { field, .. }
            | LensError::ConfigValidationError { field, .. } => {
                format!("Check the value of '{}'", field)
            }
            LensError::ApiError(_) | LensError::BackendError { .. } => {
                "Check that the inference service is reachable and retry".to_string()
            }
            LensError::ParseError { .. } | LensError::SerializationError(_) => {
                "The model returned an unexpected format; retry with a clearer photo".to_string()
            }
            LensError::AnalysisFailed { .. } => {
                "Retry later or check the Gemini API key and quota".to_string()
            }
            LensError::EnrichmentError { .. } => {
                "Price data is optional; the candidate is still usable".to_string()
            }
            LensError::IoError(_) | LensError::InvalidImageError { .. } => {
                "Provide a reachable image URL, a readable file, or valid base64 data".to_string()
            }
        }
    }

    /// 對呼叫端顯示的訊息，不暴露後端身分或內部細節
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => match self {
                // 欄位名稱只寫入日誌 (recovery_suggestion)
                LensError::MissingConfigError { .. } => {
                    "Configuration error: inference credential not configured".to_string()
                }
                other => format!("Configuration error: {}", other),
            },
            ErrorCategory::Input => format!("Invalid input: {}", self),
            _ => match self {
                LensError::AnalysisFailed { .. } => self.to_string(),
                other => format!("AI analysis failed: {}", other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;
