//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.schemaboard/config.toml`
//! 2. Local config: `.schemaboard/config.toml` (in the project directory)
//! 3. CLI overrides
//!
//! Later sources override earlier ones. A value in a later file only wins
//! when it differs from the built-in default, so partial files compose.

use crate::error::ConfigError;
use crate::{
    BoardConfig, CodegenConfig, ConfigOverrides, ExportConfig, GeminiSettings, LoggingConfig,
    ProjectConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".schemaboard";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".schemaboard";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.schemaboard`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<BoardConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.schemaboard`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a project directory.
    pub fn local_config_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a project directory with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        project_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<BoardConfig, ConfigError> {
        let mut config = BoardConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(project_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<BoardConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;
        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a project directory.
    pub fn load_local(&self, project_root: &Path) -> Result<Option<BoardConfig>, ConfigError> {
        let local_path = self.local_config_path(project_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Load an explicit configuration file, layered over the global config.
    pub fn load_file(
        &mut self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<BoardConfig, ConfigError> {
        let mut config = BoardConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        debug!("Loading config file {:?}", path);
        config = merge_configs(config, load_config_file(path)?);

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Save configuration to the local config file for a project directory.
    pub fn save_local(&self, project_root: &Path, config: &BoardConfig) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(project_root), config)
    }

    /// Initialize global configuration.
    ///
    /// Creates `~/.schemaboard/config.toml` with defaults unless it exists.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        init_config_dir(global_dir)
    }

    /// Initialize local configuration for a project directory.
    ///
    /// Creates `.schemaboard/config.toml` with defaults unless it exists.
    pub fn init_local(&self, project_root: &Path) -> Result<PathBuf, ConfigError> {
        init_config_dir(&project_root.join(LOCAL_CONFIG_DIR))
    }

    /// Forget the cached global configuration.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn init_config_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &BoardConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<BoardConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &BoardConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Pick `overlay` unless it still holds the default value.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configurations, with `overlay` taking precedence.
fn merge_configs(base: BoardConfig, overlay: BoardConfig) -> BoardConfig {
    BoardConfig {
        project: merge_project(base.project, overlay.project),
        codegen: merge_codegen(base.codegen, overlay.codegen),
        export: merge_export(base.export, overlay.export),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_project(base: ProjectConfig, overlay: ProjectConfig) -> ProjectConfig {
    let default = ProjectConfig::default();
    ProjectConfig {
        name: overlay.name.or(base.name),
        schema_file: pick(base.schema_file, overlay.schema_file, default.schema_file),
    }
}

fn merge_codegen(base: CodegenConfig, overlay: CodegenConfig) -> CodegenConfig {
    let default = CodegenConfig::default();
    CodegenConfig {
        provider: pick(base.provider, overlay.provider, default.provider),
        default_database: pick(
            base.default_database,
            overlay.default_database,
            default.default_database,
        ),
        gemini: merge_gemini(base.gemini, overlay.gemini),
    }
}

fn merge_gemini(base: GeminiSettings, overlay: GeminiSettings) -> GeminiSettings {
    let d = GeminiSettings::default();
    GeminiSettings {
        url: pick(base.url, overlay.url, d.url),
        model: pick(base.model, overlay.model, d.model),
        api_key_env: pick(base.api_key_env, overlay.api_key_env, d.api_key_env),
        timeout_secs: pick(base.timeout_secs, overlay.timeout_secs, d.timeout_secs),
        max_retries: pick(base.max_retries, overlay.max_retries, d.max_retries),
        temperature: pick(base.temperature, overlay.temperature, d.temperature),
        top_k: pick(base.top_k, overlay.top_k, d.top_k),
        top_p: pick(base.top_p, overlay.top_p, d.top_p),
        max_output_tokens: pick(
            base.max_output_tokens,
            overlay.max_output_tokens,
            d.max_output_tokens,
        ),
    }
}

fn merge_export(base: ExportConfig, overlay: ExportConfig) -> ExportConfig {
    let default = ExportConfig::default();
    ExportConfig {
        directory: pick(base.directory, overlay.directory, default.directory),
        pretty: pick(base.pretty, overlay.pretty, default.pretty),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let default = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, default.level),
        format: pick(base.format, overlay.format, default.format),
    }
}
