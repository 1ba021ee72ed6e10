//! Initialize command - Create a schema document and local configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use schemaboard_config::ConfigLoader;
use schemaboard_core::{export_document, SchemaGraph, DEFAULT_PROJECT_NAME};
use tracing::info;

use super::{load_config_at, print_info, write_document};
use crate::GlobalOptions;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Project name stored in the document and local config
    #[arg(long, short = 'n')]
    name: Option<String>,

    /// Overwrite an existing schema document with an empty one
    #[arg(long)]
    force: bool,
}

/// Execute the init command
pub async fn execute(args: InitArgs, global: GlobalOptions) -> Result<()> {
    let root = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()?.join(&args.path)
    };
    let root = root
        .canonicalize()
        .context("Failed to resolve project directory")?;

    let loader = ConfigLoader::new();
    let config_path = loader
        .init_local(&root)
        .context("Failed to create local configuration")?;

    if let Some(ref name) = args.name {
        let mut local = loader.load_local(&root)?.unwrap_or_default();
        local.project.name = Some(name.trim().to_string());
        loader
            .save_local(&root, &local)
            .context("Failed to save local configuration")?;
    }

    let config = load_config_at(&global, &root)?;
    let schema_path = config.schema_path(&root);

    if schema_path.exists() && !args.force {
        anyhow::bail!(
            "Schema document already exists at {}. Use --force to start over.",
            schema_path.display()
        );
    }

    let project = config
        .project
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(DEFAULT_PROJECT_NAME);
    let document = export_document(&SchemaGraph::new(), project, Utc::now());
    write_document(&schema_path, &document, config.export.pretty)?;

    info!("Initialized project '{}' in {}", project, root.display());
    print_info(&format!("Config:  {}", config_path.display()), global.quiet);
    println!("Created {}", schema_path.display());
    Ok(())
}
