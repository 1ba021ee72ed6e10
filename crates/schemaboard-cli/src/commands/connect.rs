//! Connect command - Link a source field to a target field

use anyhow::Result;
use clap::Args;
use schemaboard_core::{Command, Connection, SessionEvent};

use super::{resolve_field, resolve_table, Board};
use crate::GlobalOptions;

/// Arguments for the connect command
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Source table id or name
    source_table: String,

    /// Source field id or name
    source_field: String,

    /// Target table id or name (its field becomes the foreign key)
    target_table: String,

    /// Target field id or name
    target_field: String,
}

/// Execute the connect command
pub async fn execute(args: ConnectArgs, global: GlobalOptions) -> Result<()> {
    let mut board = Board::open(&global)?;
    let graph = board.graph();

    let source = resolve_table(graph, &args.source_table)?;
    let source_field = resolve_field(graph, &source, &args.source_field)?;
    let target = resolve_table(graph, &args.target_table)?;
    let target_field = resolve_field(graph, &target, &args.target_field)?;

    let events = board.apply(
        Command::Connect(Connection::between_fields(
            source,
            &source_field,
            target,
            &target_field,
        )),
        "Connecting the fields",
    )?;
    board.save()?;

    if let Some(SessionEvent::Connected { edge_id }) = events.first() {
        let name = board
            .graph()
            .relationship(edge_id)
            .map(|r| r.display_name())
            .unwrap_or_default();
        println!("Connected {} ({})", name, edge_id);
    }
    Ok(())
}
