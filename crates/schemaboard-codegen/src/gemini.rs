//! Gemini code generator
//!
//! Sends the prompt to the Google Generative Language API and returns the
//! cleaned model output.
//!
//! # Endpoint Format
//!
//! - POST `{base_url}/models/{model}:generateContent`
//! - Header: `x-goog-api-key: <key>`
//! - Request: `{"contents": [{"parts": [{"text": "..."}]}], "generationConfig": {...}, "safetySettings": [...]}`
//! - Response: `{"candidates": [{"content": {"parts": [{"text": "..."}]}}]}`
//!
//! # Example
//!
//! ```ignore
//! use schemaboard_codegen::{CodeGenerationRequest, CodeGenerator, DatabaseType, GeminiConfig, GeminiGenerator};
//!
//! let generator = GeminiGenerator::new(GeminiConfig::from_env())?;
//! let request = CodeGenerationRequest::from_graph(DatabaseType::Postgresql, &graph);
//! let response = generator.generate(&request).await;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[cfg(feature = "rate-limit")]
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
#[cfg(feature = "rate-limit")]
use std::num::NonZeroU32;
#[cfg(feature = "rate-limit")]
use std::sync::Arc;

use crate::cleanup::clean_code_response;
use crate::error::{CodegenError, Result};
use crate::prompt::build_prompt;
use crate::provider::{CodeGenerationRequest, CodeGenerationResponse, CodeGenerator};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default max retries
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 500;

const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Default requests per second limit
#[cfg(feature = "rate-limit")]
const DEFAULT_REQUESTS_PER_SECOND: u32 = 2;

#[cfg(feature = "rate-limit")]
type GeminiRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Configuration for the Gemini generator
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, without the `/models/...` suffix
    pub base_url: String,
    pub model: String,
    /// API key; `None` leaves the generator unconfigured
    pub api_key: Option<String>,
    /// Variable the key is read from, named in the missing-key message
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    /// Requests per second limit (when rate-limit feature enabled)
    #[cfg(feature = "rate-limit")]
    pub requests_per_second: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            temperature: 0.3,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
            #[cfg(feature = "rate-limit")]
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

impl GeminiConfig {
    /// Default settings with the key taken from `GEMINI_API_KEY`
    pub fn from_env() -> Self {
        Self::default().with_api_key_from_env(DEFAULT_API_KEY_ENV)
    }

    /// Read the key from `var`. Unset or blank values leave no key.
    pub fn with_api_key_from_env(mut self, var: impl Into<String>) -> Self {
        let var = var.into();
        self.api_key = std::env::var(&var)
            .ok()
            .filter(|key| !key.trim().is_empty());
        self.api_key_env = var;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set requests per second limit (when rate-limit feature enabled)
    #[cfg(feature = "rate-limit")]
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }

    /// Full `generateContent` URL for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Code generator backed by the Gemini API.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
    #[cfg(feature = "rate-limit")]
    rate_limiter: Arc<GeminiRateLimiter>,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CodegenError::Unavailable(format!("HTTP client error: {}", e)))?;

        #[cfg(feature = "rate-limit")]
        let rate_limiter = {
            let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
            Arc::new(RateLimiter::direct(Quota::per_second(rps)))
        };

        Ok(Self {
            client,
            config,
            #[cfg(feature = "rate-limit")]
            rate_limiter,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Run the full pipeline: prompt, request with retries, cleanup.
    pub async fn try_generate(&self, request: &CodeGenerationRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CodegenError::missing_api_key(&self.config.api_key_env))?;

        let prompt = build_prompt(request);
        debug!(
            "Generating {} code for {} table(s), prompt {} chars",
            request.database_type,
            request.schema.len(),
            prompt.len()
        );

        let body = self.request_body(prompt);
        let raw = self.request_with_retry(api_key, &body).await?;
        Ok(clean_code_response(&raw))
    }

    fn request_body(&self, prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }

    /// Wait for rate limiter permission (when feature enabled)
    #[cfg(feature = "rate-limit")]
    async fn wait_for_permit(&self) {
        self.rate_limiter.until_ready().await;
    }

    /// No-op when rate limiting is disabled
    #[cfg(not(feature = "rate-limit"))]
    async fn wait_for_permit(&self) {}

    async fn request_with_retry(&self, api_key: &str, body: &GenerateContentRequest) -> Result<String> {
        let mut retry_delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 0;

        loop {
            self.wait_for_permit().await;

            match self.send_request(api_key, body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    warn!("Gemini request failed (attempt {}): {}", attempt + 1, e);
                    tokio::time::sleep(retry_delay).await;
                    retry_delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_request(&self, api_key: &str, body: &GenerateContentRequest) -> Result<String> {
        let response = self
            .client
            .post(self.config.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CodegenError::Unavailable("Request timed out".into())
                } else if e.is_connect() {
                    CodegenError::Unavailable(format!("Connection failed: {}", e))
                } else {
                    CodegenError::Unavailable(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        match status {
            StatusCode::OK => {
                let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
                    debug!("Unreadable Gemini response: {}", e);
                    CodegenError::InvalidResponse
                })?;
                parsed.into_text().ok_or(CodegenError::InvalidResponse)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CodegenError::Auth(status)),
            StatusCode::NOT_FOUND => Err(CodegenError::ModelNotFound(status)),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());

                Err(CodegenError::RateLimit { retry_after })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                debug!("Gemini returned {}: {}", status, body);
                Err(CodegenError::Http(status))
            }
        }
    }
}

#[async_trait]
impl CodeGenerator for GeminiGenerator {
    async fn generate(&self, request: &CodeGenerationRequest) -> CodeGenerationResponse {
        match self.try_generate(request).await {
            Ok(code) => {
                info!("Generated {} code ({} chars)", request.database_type, code.len());
                CodeGenerationResponse::ok(code)
            }
            Err(e) => {
                warn!("AI code generation failed: {}", e);
                CodeGenerationResponse::failure(e.to_string())
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("configured", &self.config.api_key.is_some())
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}
