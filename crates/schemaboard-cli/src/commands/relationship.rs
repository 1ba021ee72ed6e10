//! Relationship commands - list, edit, remove and prune relationships

use anyhow::Result;
use clap::Subcommand;
use schemaboard_core::{edge_records, Command, RelationType, Resolver, SessionEvent};

use super::{parse_relation_type_arg, resolve_relationship, Board};
use crate::GlobalOptions;

/// Relationship management commands
#[derive(Subcommand, Debug)]
pub enum RelationshipCommand {
    /// List relationships
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a relationship's cardinality or name
    Edit {
        /// Relationship id or name
        relationship: String,

        /// Cardinality (1:1, 1:N, N:N)
        #[arg(long = "type", short = 't', value_parser = parse_relation_type_arg)]
        relationship_type: Option<RelationType>,

        /// New name (blank saves as "unnamed_relation")
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a relationship
    Remove {
        /// Relationship id or name
        relationship: String,
    },

    /// Remove relationships whose tables no longer exist
    Prune,
}

/// Execute a relationship command
pub async fn execute(cmd: RelationshipCommand, global: GlobalOptions) -> Result<()> {
    let mut board = Board::open(&global)?;

    match cmd {
        RelationshipCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&edge_records(board.graph()))?);
                return Ok(());
            }

            let graph = board.graph();
            if graph.relationship_count() == 0 {
                println!("No relationships");
                return Ok(());
            }
            let resolver = Resolver::new(graph);
            for edge in graph.relationships() {
                println!(
                    "{}: {} -> {} ({}) [{}]",
                    edge.display_name(),
                    resolver.table_name(&edge.source),
                    resolver.table_name(&edge.target),
                    edge.relationship,
                    edge.id
                );
            }
        }

        RelationshipCommand::Edit {
            relationship,
            relationship_type,
            name,
        } => {
            let edge_id = resolve_relationship(board.graph(), &relationship)?;
            let events = board.session.edit_relationship(&edge_id, |editor| {
                if let Some(relationship_type) = relationship_type {
                    editor.set_relationship(relationship_type);
                }
                if let Some(name) = name {
                    editor.set_name(name);
                }
            });
            if events.is_empty() {
                anyhow::bail!("Relationship '{}' not found", relationship);
            }
            board.save()?;

            if let Some(edge) = board.graph().relationship(&edge_id) {
                println!("Saved {} ({})", edge.display_name(), edge.relationship);
            }
        }

        RelationshipCommand::Remove { relationship } => {
            let edge_id = resolve_relationship(board.graph(), &relationship)?;
            board.apply(Command::Disconnect { edge_id }, "Removing the relationship")?;
            board.save()?;
            println!("Removed relationship '{}'", relationship);
        }

        RelationshipCommand::Prune => {
            let events = board.session.apply(Command::PruneDangling);
            match events.first() {
                Some(SessionEvent::RelationshipsPruned { edge_ids }) => {
                    board.save()?;
                    println!("Pruned {} relationship(s)", edge_ids.len());
                }
                _ => println!("No dangling relationships"),
            }
        }
    }

    Ok(())
}
