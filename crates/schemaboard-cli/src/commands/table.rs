//! Table commands - add, rename, move, remove and list tables

use anyhow::Result;
use clap::Subcommand;
use schemaboard_core::{table_records, Command, Position, SessionEvent};

use super::{resolve_table, Board};
use crate::GlobalOptions;

/// Table management commands
#[derive(Subcommand, Debug)]
pub enum TableCommand {
    /// Add an empty table
    Add {
        /// Table name (defaults to "New Table")
        name: Option<String>,

        /// Canvas x coordinate (random when omitted)
        #[arg(long, requires = "y", allow_negative_numbers = true)]
        x: Option<f64>,

        /// Canvas y coordinate (random when omitted)
        #[arg(long, requires = "x", allow_negative_numbers = true)]
        y: Option<f64>,
    },

    /// Rename a table and the relationships named after it
    Rename {
        /// Table id or name
        table: String,
        /// New name
        name: String,
    },

    /// Move a table on the canvas
    Move {
        /// Table id or name
        table: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Remove a table (its relationships are kept unless --prune)
    Remove {
        /// Table id or name
        table: String,

        /// Also drop relationships left without an endpoint
        #[arg(long)]
        prune: bool,
    },

    /// List tables and their fields
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute a table command
pub async fn execute(cmd: TableCommand, global: GlobalOptions) -> Result<()> {
    let mut board = Board::open(&global)?;

    match cmd {
        TableCommand::Add { name, x, y } => {
            let position = x.zip(y).map(|(x, y)| Position::new(x, y));
            let events = board.apply(Command::AddTable { name, position }, "Adding the table")?;
            board.save()?;
            if let Some(SessionEvent::TableAdded { table_id }) = events.first() {
                let name = board.graph().table(table_id).map(|t| t.name.as_str()).unwrap_or("");
                println!("Added table '{}' ({})", name, table_id);
            }
        }

        TableCommand::Rename { table, name } => {
            let table_id = resolve_table(board.graph(), &table)?;
            let events = board.apply(
                Command::RenameTable {
                    table_id,
                    name: name.clone(),
                },
                "Renaming the table",
            )?;
            board.save()?;
            if let Some(SessionEvent::TableRenamed {
                relationships_renamed,
                ..
            }) = events.first()
            {
                println!(
                    "Renamed '{}' to '{}' ({} relationship(s) renamed)",
                    table, name, relationships_renamed
                );
            }
        }

        TableCommand::Move { table, x, y } => {
            let table_id = resolve_table(board.graph(), &table)?;
            board.apply(
                Command::MoveTable {
                    table_id,
                    position: Position::new(x, y),
                },
                "Moving the table",
            )?;
            board.save()?;
            println!("Moved '{}' to ({}, {})", table, x, y);
        }

        TableCommand::Remove { table, prune } => {
            let table_id = resolve_table(board.graph(), &table)?;
            let events = board.apply(Command::DeleteTable { table_id }, "Removing the table")?;
            let dangling = match events.first() {
                Some(SessionEvent::TableDeleted {
                    dangling_relationships,
                    ..
                }) => *dangling_relationships,
                _ => 0,
            };

            if prune && dangling > 0 {
                board.session.apply(Command::PruneDangling);
                println!("Removed table '{}' and {} relationship(s)", table, dangling);
            } else if dangling > 0 {
                println!(
                    "Removed table '{}' ({} relationship(s) now dangling)",
                    table, dangling
                );
            } else {
                println!("Removed table '{}'", table);
            }
            board.save()?;
        }

        TableCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&table_records(board.graph()))?);
                return Ok(());
            }

            if board.graph().table_count() == 0 {
                println!("No tables");
                return Ok(());
            }
            for table in board.graph().tables() {
                println!("{} ({})", table.name, table.id);
                for field in &table.fields {
                    let mut line = format!("  - {}: {}", field.name, field.field_type);
                    if let Some(length) = field.length {
                        line.push_str(&format!("({})", length));
                    }
                    for (flag, label) in [
                        (field.is_primary, "PK"),
                        (field.is_required, "NOT NULL"),
                        (field.is_unique, "UNIQUE"),
                        (field.is_foreign, "FK"),
                    ] {
                        if flag {
                            line.push(' ');
                            line.push_str(label);
                        }
                    }
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}
