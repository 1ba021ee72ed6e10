//! SchemaBoard Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.schemaboard/config.toml`
//! - Local config: `.schemaboard/config.toml` (next to the schema document)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use schemaboard_codegen::DatabaseType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for SchemaBoard.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    /// Project defaults
    pub project: ProjectConfig,

    /// Code generation settings
    pub codegen: CodegenConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Project defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name used for new documents (None = "Untitled Project")
    pub name: Option<String>,

    /// Schema document used when `--file` is not given
    pub schema_file: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            schema_file: PathBuf::from("schema.json"),
        }
    }
}

/// Code generation configuration.
///
/// # Example TOML
///
/// ```toml
/// [codegen]
/// provider = "gemini"
/// default_database = "postgresql"
///
/// [codegen.gemini]
/// model = "gemini-2.0-flash"
/// api_key_env = "GEMINI_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodegenConfig {
    /// Which provider generates code
    pub provider: CodegenProviderType,

    /// Dialect used when `generate` is run without `--database`
    pub default_database: String,

    /// Gemini provider settings
    pub gemini: GeminiSettings,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            provider: CodegenProviderType::default(),
            default_database: "sql".to_string(),
            gemini: GeminiSettings::default(),
        }
    }
}

impl CodegenConfig {
    /// The configured default dialect, parsed by the code generator's rules.
    pub fn database(&self) -> Result<DatabaseType, ConfigError> {
        self.default_database
            .parse()
            .map_err(ConfigError::UnknownDatabase)
    }

    /// Validate the dialect and the provider settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database()?;

        match self.provider {
            CodegenProviderType::Gemini => self.gemini.validate(),
        }
    }
}

/// Code generation provider selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CodegenProviderType {
    /// Google Gemini `generateContent` API (default)
    #[default]
    Gemini,
}

impl std::fmt::Display for CodegenProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for CodegenProviderType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Gemini provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiSettings {
    /// API base URL, without the `/models/...` suffix
    pub url: String,

    /// Model name
    pub model: String,

    /// Environment variable name containing the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry attempts
    pub max_retries: u32,

    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            temperature: 0.3,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 8192,
        }
    }
}

impl GeminiSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingSetting("codegen.gemini.url"));
        }
        if self.model.is_empty() {
            return Err(ConfigError::MissingSetting("codegen.gemini.model"));
        }
        ConfigError::check_range("codegen.gemini.temperature", self.temperature, 0.0, 2.0)?;
        ConfigError::check_range("codegen.gemini.top_p", self.top_p, 0.0, 1.0)?;
        Ok(())
    }

    /// Read the API key from `api_key_env`. Empty values count as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory `export` writes `<project>_schema.json` into
    pub directory: PathBuf,

    /// Indent the exported JSON
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            pretty: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override the schema document path
    pub schema_file: Option<PathBuf>,

    /// Override the default dialect
    pub default_database: Option<String>,

    /// Override the Gemini model
    pub gemini_model: Option<String>,

    /// Override the Gemini base URL
    pub gemini_url: Option<String>,

    /// Override log level
    pub log_level: Option<String>,
}

impl BoardConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref path) = overrides.schema_file {
            self.project.schema_file = path.clone();
        }

        if let Some(ref database) = overrides.default_database {
            self.codegen.default_database = database.clone();
        }

        if let Some(ref model) = overrides.gemini_model {
            self.codegen.gemini.model = model.clone();
        }

        if let Some(ref url) = overrides.gemini_url {
            self.codegen.gemini.url = url.clone();
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.codegen.validate()?;
        Ok(())
    }

    /// Resolve the schema document path against `root`.
    pub fn schema_path(&self, root: &Path) -> PathBuf {
        if self.project.schema_file.is_absolute() {
            self.project.schema_file.clone()
        } else {
            root.join(&self.project.schema_file)
        }
    }

    /// Resolve the export directory against `root`.
    pub fn export_dir(&self, root: &Path) -> PathBuf {
        if self.export.directory.is_absolute() {
            self.export.directory.clone()
        } else {
            root.join(&self.export.directory)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = BoardConfig::default();
        assert_eq!(config.project.schema_file, PathBuf::from("schema.json"));
        assert_eq!(config.codegen.provider, CodegenProviderType::Gemini);
        assert_eq!(config.codegen.default_database, "sql");
        assert_eq!(config.codegen.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.codegen.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.codegen.gemini.top_k, 40);
        assert_eq!(config.codegen.gemini.max_output_tokens, 8192);
        assert!(config.export.pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = BoardConfig::default();
        let overrides = ConfigOverrides {
            schema_file: Some(PathBuf::from("/tmp/shop.json")),
            default_database: Some("postgresql".to_string()),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.project.schema_file, PathBuf::from("/tmp/shop.json"));
        assert_eq!(config.codegen.default_database, "postgresql");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.codegen.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_schema_path_resolution() {
        let config = BoardConfig::default();
        let root = PathBuf::from("/home/user/project");
        assert_eq!(
            config.schema_path(&root),
            PathBuf::from("/home/user/project/schema.json")
        );

        let mut config = BoardConfig::default();
        config.project.schema_file = PathBuf::from("/abs/schema.json");
        assert_eq!(config.schema_path(&root), PathBuf::from("/abs/schema.json"));
    }

    #[test]
    fn test_export_dir_resolution() {
        let config = BoardConfig::default();
        assert_eq!(
            config.export_dir(Path::new("/project")),
            PathBuf::from("/project/.")
        );
    }

    #[test]
    fn test_provider_type_round_trip() {
        assert_eq!(CodegenProviderType::Gemini.to_string(), "gemini");
        assert_eq!(
            "Gemini".parse::<CodegenProviderType>().unwrap(),
            CodegenProviderType::Gemini
        );
        assert!("openai".parse::<CodegenProviderType>().is_err());
    }

    #[test]
    fn test_validate_unknown_database() {
        let mut config = BoardConfig::default();
        config.codegen.default_database = "db2".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDatabase(_)));
        assert!(err.to_string().contains("'db2'"));
        assert!(err.to_string().contains("mssql"));
    }

    #[test]
    fn test_validate_database_case_insensitive() {
        let mut config = BoardConfig::default();
        config.codegen.default_database = "PostgreSQL".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.codegen.database().unwrap(), DatabaseType::Postgresql);
    }

    #[test]
    fn test_every_generator_dialect_is_accepted() {
        let mut config = BoardConfig::default();
        for db in DatabaseType::ALL {
            config.codegen.default_database = db.to_string();
            assert_eq!(config.codegen.database().unwrap(), db);
        }
    }

    #[test]
    fn test_validate_gemini_settings() {
        let mut settings = GeminiSettings::default();
        settings.model = String::new();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingSetting("codegen.gemini.model"))
        ));

        let mut settings = GeminiSettings::default();
        settings.temperature = 3.5;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange {
                key: "codegen.gemini.temperature",
                ..
            })
        ));
    }

    #[test]
    fn test_api_key_from_env() {
        let settings = GeminiSettings {
            api_key_env: "SCHEMABOARD_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.api_key(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BoardConfig = toml::from_str(
            r#"
            [codegen.gemini]
            model = "gemini-1.5-pro"
            "#,
        )
        .unwrap();
        assert_eq!(config.codegen.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.codegen.gemini.top_k, 40);
        assert_eq!(config.logging.level, "info");
    }
}
