//! Error types for schemaboard-codegen

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while talking to a code generation backend.
///
/// The `Display` text is what ends up in
/// [`CodeGenerationResponse::error`](crate::CodeGenerationResponse).
#[derive(Error, Debug)]
pub enum CodegenError {
    /// No API key in the configured environment variable
    #[error("Gemini API key is not configured. Please set {env_var} in your environment variables.")]
    MissingApiKey { env_var: String },

    /// 401/403 from the provider
    #[error("API request failed: {0}")]
    Auth(StatusCode),

    /// 404 from the provider, usually a bad model name
    #[error("API request failed: {0}")]
    ModelNotFound(StatusCode),

    /// 429 from the provider
    #[error("API request failed: 429 Too Many Requests (retry after {retry_after:?} seconds)")]
    RateLimit { retry_after: Option<u64> },

    /// Any other non-success status
    #[error("API request failed: {0}")]
    Http(StatusCode),

    /// Response body without `candidates[0].content.parts[0].text`
    #[error("Invalid response format from Gemini API")]
    InvalidResponse,

    /// Transport failure (timeout, connection refused, ...)
    #[error("Code generator unavailable: {0}")]
    Unavailable(String),
}

impl CodegenError {
    pub fn missing_api_key(env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            env_var: env_var.into(),
        }
    }

    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit { .. } | Self::Unavailable(_) => true,
            Self::Http(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Result type for schemaboard-codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;
