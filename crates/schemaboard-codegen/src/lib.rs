//! SchemaBoard Codegen - AI-assisted DDL generation
//!
//! Turns an exported schema into dialect-specific code through a remote
//! language model:
//! - `provider` - `CodeGenerator` trait, `DatabaseType` and request/response types
//! - `prompt` - Prompt construction from table and edge records
//! - `cleanup` - Stripping fences and prose from model output
//! - `gemini` - Gemini API backend with retries and optional rate limiting

pub mod cleanup;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod provider;

pub use cleanup::clean_code_response;
pub use error::{CodegenError, Result};
pub use gemini::{GeminiConfig, GeminiGenerator, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use prompt::build_prompt;
pub use provider::{CodeGenerationRequest, CodeGenerationResponse, CodeGenerator, DatabaseType};
