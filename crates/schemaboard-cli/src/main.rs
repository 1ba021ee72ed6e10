//! SchemaBoard CLI - Database schema editing from the terminal
//!
//! Edits a schema document (tables, fields, relationships) the way the
//! canvas does, and renders it as JSON, quick SQL or AI-generated DDL.
//!
//! # Usage
//!
//! ```bash
//! # Start a schema in the current directory
//! schemaboard init --name Shop
//!
//! # Add tables and fields
//! schemaboard table add users
//! schemaboard field add users id --primary --required
//!
//! # Link two fields and name the relationship
//! schemaboard connect users id orders user_id
//! schemaboard relationship edit users_orders --type 1:N
//!
//! # Render
//! schemaboard sql
//! schemaboard generate --database postgresql
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use schemaboard_config::{ConfigOverrides, LogFormat, LoggingConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

/// SchemaBoard - Visual database schema editor, command-line edition
#[derive(Parser, Debug)]
#[command(name = "schemaboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Schema document to operate on
    #[arg(long, short = 'f', global = true, env = "SCHEMABOARD_FILE")]
    file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, short = 'c', global = true, env = "SCHEMABOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        let log_level = if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        };

        ConfigOverrides {
            schema_file: self.file.clone(),
            log_level,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a schema document and local configuration
    Init(commands::init::InitArgs),

    /// Add, rename, move, remove and list tables
    #[command(subcommand)]
    Table(commands::table::TableCommand),

    /// Add, update and remove fields
    #[command(subcommand)]
    Field(commands::field::FieldCommand),

    /// Link a source field to a target field
    Connect(commands::connect::ConnectArgs),

    /// List, edit and remove relationships
    #[command(subcommand)]
    Relationship(commands::relationship::RelationshipCommand),

    /// Project settings
    #[command(subcommand)]
    Project(commands::project::ProjectCommand),

    /// Write the schema as a `<project>_schema.json` file
    Export(commands::export::ExportArgs),

    /// Replace the schema with an exported document
    Import(commands::import::ImportArgs),

    /// Render the schema as CREATE TABLE statements
    Sql(commands::sql::SqlArgs),

    /// Generate dialect-specific code with an AI provider
    Generate(commands::generate::GenerateArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

/// Install the stderr subscriber for the effective logging settings
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(builder.with_ansi(true).finish())?
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config errors resurface in the command itself
    let logging = commands::load_config(&cli.global)
        .map(|config| config.logging)
        .unwrap_or_else(|_| {
            let mut logging = LoggingConfig::default();
            if let Some(level) = cli.global.to_config_overrides().log_level {
                logging.level = level;
            }
            logging
        });
    init_logging(&logging)?;

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.global).await,
        Commands::Table(cmd) => commands::table::execute(cmd, cli.global).await,
        Commands::Field(cmd) => commands::field::execute(cmd, cli.global).await,
        Commands::Connect(args) => commands::connect::execute(args, cli.global).await,
        Commands::Relationship(cmd) => commands::relationship::execute(cmd, cli.global).await,
        Commands::Project(cmd) => commands::project::execute(cmd, cli.global).await,
        Commands::Export(args) => commands::export::execute(args, cli.global).await,
        Commands::Import(args) => commands::import::execute(args, cli.global).await,
        Commands::Sql(args) => commands::sql::execute(args, cli.global).await,
        Commands::Generate(args) => commands::generate::execute(args, cli.global).await,
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global).await,
    }
}
