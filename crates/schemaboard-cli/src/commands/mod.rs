//! CLI command implementations
//!
//! Every editing command follows the same cycle: open the board (config and
//! schema document), apply session commands, write the document back.

pub mod config;
pub mod connect;
pub mod export;
pub mod field;
pub mod generate;
pub mod import;
pub mod init;
pub mod project;
pub mod relationship;
pub mod sql;
pub mod table;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use schemaboard_config::{BoardConfig, ConfigLoader};
use schemaboard_core::{
    export_document, parse_field_type, parse_relation_type, Command, FieldType, RelationType,
    SchemaDocument, SchemaGraph, SchemaSession, SessionEvent,
};

use crate::GlobalOptions;

/// Project directory: the current working directory.
pub fn project_root() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration with optional config file override and CLI overrides.
pub fn load_config(global: &GlobalOptions) -> Result<BoardConfig> {
    let root = project_root()?;
    load_config_at(global, &root)
}

/// Load configuration for an explicit project directory.
pub fn load_config_at(global: &GlobalOptions, root: &Path) -> Result<BoardConfig> {
    let mut loader = ConfigLoader::new();
    let overrides = global.to_config_overrides();

    let config = match global.config {
        Some(ref config_path) => loader
            .load_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()))?,
        None => loader
            .load(root, Some(&overrides))
            .context("Failed to load configuration")?,
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// An opened schema document with its configuration.
pub struct Board {
    pub root: PathBuf,
    pub config: BoardConfig,
    pub schema_path: PathBuf,
    pub session: SchemaSession,
}

impl Board {
    /// Open the board for the current directory.
    ///
    /// A missing schema document is not an error: the board starts empty.
    pub fn open(global: &GlobalOptions) -> Result<Self> {
        Self::load(global, true)
    }

    /// Open the board without reading the current document, for commands
    /// that replace it wholesale. A corrupt document can still be replaced.
    pub fn open_for_replace(global: &GlobalOptions) -> Result<Self> {
        Self::load(global, false)
    }

    fn load(global: &GlobalOptions, read_document: bool) -> Result<Self> {
        let root = project_root()?;
        let config = load_config_at(global, &root)?;
        let schema_path = config.schema_path(&root);
        let mut session = SchemaSession::new();

        if read_document && schema_path.exists() {
            let text = std::fs::read_to_string(&schema_path).with_context(|| {
                format!("Failed to read schema document {}", schema_path.display())
            })?;
            session
                .import_text(&text)
                .map_err(|e| anyhow::anyhow!("Failed to import schema: {}", e))?;
        } else if let Some(ref name) = config.project.name {
            session.apply(Command::RenameProject { name: name.clone() });
        }

        Ok(Self {
            root,
            config,
            schema_path,
            session,
        })
    }

    pub fn graph(&self) -> &SchemaGraph {
        self.session.graph()
    }

    /// Apply a command, failing when it changed nothing.
    pub fn apply(&mut self, command: Command, what: &str) -> Result<Vec<SessionEvent>> {
        let events = self.session.apply(command);
        if events.is_empty() {
            anyhow::bail!("{} had no effect", what);
        }
        Ok(events)
    }

    /// The document as it would be exported right now.
    pub fn document(&self) -> SchemaDocument {
        export_document(self.session.graph(), self.session.project_name(), Utc::now())
    }

    /// Write the document back to the schema path.
    pub fn save(&self) -> Result<()> {
        write_document(&self.schema_path, &self.document(), self.config.export.pretty)
    }
}

/// Serialize a document to `path`, creating parent directories.
pub fn write_document(path: &Path, document: &SchemaDocument, pretty: bool) -> Result<()> {
    let text = if pretty {
        document.to_json_pretty()
    } else {
        serde_json::to_string(document)
    }
    .context("Failed to serialize schema document")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Find a table by id, or by name when the name is unique.
pub fn resolve_table(graph: &SchemaGraph, reference: &str) -> Result<String> {
    if graph.contains_table(reference) {
        return Ok(reference.to_string());
    }

    let matches: Vec<&str> = graph
        .tables()
        .filter(|t| t.name == reference)
        .map(|t| t.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => anyhow::bail!("Table '{}' not found", reference),
        _ => anyhow::bail!(
            "Table name '{}' is ambiguous ({} tables); use the table id",
            reference,
            matches.len()
        ),
    }
}

/// Find a field of a table by id, or by name when the name is unique.
pub fn resolve_field(graph: &SchemaGraph, table_id: &str, reference: &str) -> Result<String> {
    let table = graph
        .table(table_id)
        .ok_or_else(|| anyhow::anyhow!("Table '{}' not found", table_id))?;
    if table.field(reference).is_some() {
        return Ok(reference.to_string());
    }

    let matches: Vec<&str> = table
        .fields
        .iter()
        .filter(|f| f.name == reference)
        .map(|f| f.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => anyhow::bail!("Field '{}' not found in table '{}'", reference, table.name),
        _ => anyhow::bail!(
            "Field name '{}' is ambiguous in table '{}'; use the field id",
            reference,
            table.name
        ),
    }
}

/// Find a relationship by id, or by its exported name when unique.
pub fn resolve_relationship(graph: &SchemaGraph, reference: &str) -> Result<String> {
    if graph.relationship(reference).is_some() {
        return Ok(reference.to_string());
    }

    let matches: Vec<&str> = graph
        .relationships()
        .filter(|r| r.display_name() == reference)
        .map(|r| r.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => anyhow::bail!("Relationship '{}' not found", reference),
        _ => anyhow::bail!(
            "Relationship name '{}' is ambiguous; use the relationship id",
            reference
        ),
    }
}

/// clap value parser for field types
pub fn parse_field_type_arg(s: &str) -> Result<FieldType, String> {
    parse_field_type(s).ok_or_else(|| {
        let known: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown field type '{}'. Valid values: {}", s, known.join(", "))
    })
}

/// clap value parser for relationship cardinalities
pub fn parse_relation_type_arg(s: &str) -> Result<RelationType, String> {
    parse_relation_type(s)
        .ok_or_else(|| format!("unknown relationship type '{}'. Valid values: 1:1, 1:N, N:N", s))
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
