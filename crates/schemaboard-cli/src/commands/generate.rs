//! Generate command - AI-assisted dialect code generation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use schemaboard_codegen::{CodeGenerationRequest, CodeGenerator, GeminiConfig, GeminiGenerator};
use schemaboard_config::{CodegenProviderType, ConfigOverrides, GeminiSettings};
use tracing::debug;

use super::{print_info, Board};
use crate::GlobalOptions;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Target dialect (sql, mysql, postgresql, mongodb, sqlite, mariadb, oracle, mssql)
    #[arg(long, short = 'd')]
    database: Option<String>,

    /// Additional requirements appended to the prompt
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Write the code to a file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Gemini model to use
    #[arg(long, env = "SCHEMABOARD_GEMINI_MODEL")]
    model: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "SCHEMABOARD_GEMINI_URL")]
    url: Option<String>,
}

impl GenerateArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            default_database: self.database.clone(),
            gemini_model: self.model.clone(),
            gemini_url: self.url.clone(),
            ..Default::default()
        }
    }
}

/// Translate the config crate's Gemini settings into a generator config.
pub fn gemini_config(settings: &GeminiSettings) -> GeminiConfig {
    GeminiConfig {
        base_url: settings.url.clone(),
        model: settings.model.clone(),
        api_key: settings.api_key(),
        api_key_env: settings.api_key_env.clone(),
        timeout_secs: settings.timeout_secs,
        max_retries: settings.max_retries,
        temperature: settings.temperature,
        top_k: settings.top_k,
        top_p: settings.top_p,
        max_output_tokens: settings.max_output_tokens,
        ..GeminiConfig::default()
    }
}

/// Execute the generate command
pub async fn execute(args: GenerateArgs, global: GlobalOptions) -> Result<()> {
    let mut board = Board::open(&global)?;
    board.config.apply_overrides(&args.overrides());
    board.config.validate().context("Invalid configuration")?;

    let database = board.config.codegen.database()?;

    let generator: Box<dyn CodeGenerator> = match board.config.codegen.provider {
        CodegenProviderType::Gemini => Box::new(
            GeminiGenerator::new(gemini_config(&board.config.codegen.gemini))
                .context("Failed to create code generator")?,
        ),
    };
    debug!(
        "Using {} generator (configured: {})",
        generator.provider_name(),
        generator.is_configured()
    );

    let mut request = CodeGenerationRequest::from_graph(database, &board.session.snapshot());
    if let Some(prompt) = args.prompt {
        request = request.with_custom_prompt(prompt);
    }

    print_info(
        &format!("Generating {} code with {}...", database, generator.provider_name()),
        global.quiet,
    );
    let response = generator.generate(&request).await;
    if !response.success {
        anyhow::bail!(
            "Code generation failed: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    match args.output {
        Some(path) => {
            std::fs::write(&path, &response.code)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_info(&format!("Wrote {}", path.display()), global.quiet);
        }
        None => println!("{}", response.code),
    }
    Ok(())
}
