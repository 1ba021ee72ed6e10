//! Config command - View and manage configuration
//!
//! - Show the effective configuration (TOML or JSON)
//! - Create a default config file (local or global)
//! - Show configuration file paths

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use schemaboard_config::ConfigLoader;
use serde::Serialize;

use super::{load_config, project_root};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a config file with default values
    Init {
        /// Create ~/.schemaboard/config.toml instead of the local file
        #[arg(long)]
        global: bool,
    },

    /// Show configuration file paths
    Path {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => execute_show(json, global),
        ConfigCommand::Init { global: in_home } => execute_init(in_home),
        ConfigCommand::Path { json } => execute_path(json),
    }
}

fn execute_show(json: bool, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to render configuration")?
        );
    }
    Ok(())
}

fn execute_init(in_home: bool) -> Result<()> {
    let loader = ConfigLoader::new();
    let path = if in_home {
        loader.init_global()?
    } else {
        loader.init_local(&project_root()?)?
    };
    println!("Config: {}", path.display());
    Ok(())
}

fn execute_path(json: bool) -> Result<()> {
    let loader = ConfigLoader::new();
    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&project_root()?);

    let paths = ConfigPaths {
        global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    println!("Configuration Paths");
    println!("===================\n");

    match paths.global {
        Some(ref gp) => {
            let status = if paths.global_exists { "exists" } else { "not found" };
            println!("Global: {} ({})", gp.display(), status);
        }
        None => println!("Global: not available (no home directory)"),
    }

    let status = if paths.local_exists { "exists" } else { "not found" };
    println!("Local:  {} ({})", paths.local.display(), status);
    Ok(())
}
