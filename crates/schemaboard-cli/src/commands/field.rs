//! Field commands - add, update and remove fields

use anyhow::Result;
use clap::{Args, Subcommand};
use schemaboard_core::{Command, FieldPatch, FieldType, SessionEvent};

use super::{parse_field_type_arg, resolve_field, resolve_table, Board};
use crate::GlobalOptions;

/// Field management commands
#[derive(Subcommand, Debug)]
pub enum FieldCommand {
    /// Append a field to a table
    Add(AddArgs),

    /// Change a field's name, type, length or flags
    Update(UpdateArgs),

    /// Remove a field from a table
    Remove {
        /// Table id or name
        table: String,
        /// Field id or name
        field: String,
    },
}

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Table id or name
    table: String,

    /// Field name (defaults to "column_name")
    name: Option<String>,

    /// Column type (INTEGER, VARCHAR, TEXT, ...)
    #[arg(long = "type", short = 't', value_parser = parse_field_type_arg)]
    field_type: Option<FieldType>,

    /// VARCHAR length
    #[arg(long)]
    length: Option<u32>,

    /// Part of the primary key
    #[arg(long)]
    primary: bool,

    /// NOT NULL
    #[arg(long)]
    required: bool,

    #[arg(long)]
    unique: bool,
}

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Table id or name
    table: String,

    /// Field id or name
    field: String,

    /// New name
    #[arg(long)]
    name: Option<String>,

    /// New column type
    #[arg(long = "type", short = 't', value_parser = parse_field_type_arg)]
    field_type: Option<FieldType>,

    /// New VARCHAR length
    #[arg(long, conflicts_with = "clear_length")]
    length: Option<u32>,

    /// Drop the VARCHAR length
    #[arg(long)]
    clear_length: bool,

    #[arg(long)]
    primary: Option<bool>,

    #[arg(long)]
    required: Option<bool>,

    #[arg(long)]
    unique: Option<bool>,
}

impl AddArgs {
    fn patch(&self) -> FieldPatch {
        FieldPatch {
            name: self.name.clone(),
            field_type: self.field_type,
            length: self.length.map(Some),
            is_primary: self.primary.then_some(true),
            is_required: self.required.then_some(true),
            is_unique: self.unique.then_some(true),
            ..FieldPatch::default()
        }
    }
}

impl UpdateArgs {
    fn patch(&self) -> FieldPatch {
        let length = if self.clear_length {
            Some(None)
        } else {
            self.length.map(Some)
        };
        FieldPatch {
            name: self.name.clone(),
            field_type: self.field_type,
            length,
            is_primary: self.primary,
            is_required: self.required,
            is_unique: self.unique,
            ..FieldPatch::default()
        }
    }
}

/// Execute a field command
pub async fn execute(cmd: FieldCommand, global: GlobalOptions) -> Result<()> {
    let mut board = Board::open(&global)?;

    match cmd {
        FieldCommand::Add(args) => {
            let table_id = resolve_table(board.graph(), &args.table)?;
            let events = board.apply(
                Command::AddField {
                    table_id: table_id.clone(),
                    patch: args.patch(),
                },
                "Adding the field",
            )?;
            board.save()?;
            if let Some(SessionEvent::FieldAdded { field_id, .. }) = events.first() {
                let name = board
                    .graph()
                    .table(&table_id)
                    .and_then(|t| t.field(field_id))
                    .map(|f| f.name.as_str())
                    .unwrap_or("");
                println!("Added field '{}' ({}) to '{}'", name, field_id, args.table);
            }
        }

        FieldCommand::Update(args) => {
            let patch = args.patch();
            if patch.is_empty() {
                anyhow::bail!("Nothing to update; pass at least one of --name, --type, --length, --clear-length, --primary, --required, --unique");
            }
            let table_id = resolve_table(board.graph(), &args.table)?;
            let field_id = resolve_field(board.graph(), &table_id, &args.field)?;
            board.apply(
                Command::UpdateField {
                    table_id,
                    field_id,
                    patch,
                },
                "Updating the field",
            )?;
            board.save()?;
            println!("Updated field '{}' in '{}'", args.field, args.table);
        }

        FieldCommand::Remove { table, field } => {
            let table_id = resolve_table(board.graph(), &table)?;
            let field_id = resolve_field(board.graph(), &table_id, &field)?;
            board.apply(
                Command::RemoveField { table_id, field_id },
                "Removing the field",
            )?;
            board.save()?;
            println!("Removed field '{}' from '{}'", field, table);
        }
    }

    Ok(())
}
